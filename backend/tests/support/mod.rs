#![allow(dead_code)]

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use moon_reports::config::Settings;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// Moon parameters for the start of Ramadan 1445 at three sites.
pub const RAMADAN_1445_CSV: &str = "\
date,location,hijri_month,hijri_year,moon_age_h,elongation,moon_altitude,sun_altitude,w
2024-03-10,Mecca,9,1445,14.8,9.9,5.1,-0.8,0.23
2024-03-10,Rabat,9,1445,17.1,10.6,6.4,-0.8,0.26
2024-03-10,Jakarta,9,1445,8.2,7.1,0.9,-0.8,0.12
2024-03-11,Mecca,9,1445,38.8,21.4,17.9,-0.8,1.08
2024-03-11,Rabat,9,1445,41.1,22.6,19.8,-0.8,1.2
";

/// A second file with an extra column and a different month.
pub const SHAWWAL_1445_TSV: &str = "\
date\tlocation\thijri_month\thijri_year\tmoon_age_h\televation_m
2024-04-08\tMecca\t10\t1445\t6.5\t277
2024-04-09\tMecca\t10\t1445\t30.5\t277
";

/// Write the standard fixture data set to `dir` (one nested file).
pub fn write_fixture_data(dir: &Path) {
    fs::create_dir_all(dir.join("1445")).unwrap();
    fs::write(dir.join("ramadan.csv"), RAMADAN_1445_CSV).unwrap();
    fs::write(dir.join("1445").join("shawwal.tsv"), SHAWWAL_1445_TSV).unwrap();
    fs::write(dir.join("README.txt"), "not a data file").unwrap();
}

/// Settings pointing every directory inside `root`.
pub fn settings_in(root: &Path) -> Settings {
    Settings {
        data_dir: root.join("data"),
        output_dir: root.join("reports"),
        static_dir: root.join("static"),
        index_file: root.join("index.html"),
        data_ready_timeout_secs: 5,
        ..Settings::default()
    }
}

/// Files currently in `dir`, or none if it does not exist.
pub fn files_in(dir: &Path) -> Vec<PathBuf> {
    match fs::read_dir(dir) {
        Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
        Err(_) => Vec::new(),
    }
}
