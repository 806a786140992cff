//! Dataset Store
//! Read-through cache over the four input CSV files. Each table is loaded at
//! most once per session; changing the data directory clears the cache.

use polars::prelude::*;
use rayon::prelude::*;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

use super::loader::{
    load_case_timeseries, load_hospital_beds, load_state_wise, load_testing, DataError,
};

/// The four datasets the dashboard reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    CaseTimeSeries,
    StateWise,
    Testing,
    HospitalBeds,
}

impl Dataset {
    pub const ALL: [Dataset; 4] = [
        Dataset::CaseTimeSeries,
        Dataset::StateWise,
        Dataset::Testing,
        Dataset::HospitalBeds,
    ];

    /// Fixed file name under the data directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            Dataset::CaseTimeSeries => "case_time_series.csv",
            Dataset::StateWise => "state_wise.csv",
            Dataset::Testing => "ICMR_Testing_Data.csv",
            Dataset::HospitalBeds => "HospitalBedsIndia.csv",
        }
    }

    fn load(&self, path: &Path) -> Result<DataFrame, DataError> {
        match self {
            Dataset::CaseTimeSeries => load_case_timeseries(path),
            Dataset::StateWise => load_state_wise(path),
            Dataset::Testing => load_testing(path),
            Dataset::HospitalBeds => load_hospital_beds(path),
        }
    }
}

/// Holds the loaded tables for one data directory.
pub struct DataStore {
    dir: PathBuf,
    cache: HashMap<Dataset, DataFrame>,
}

impl DataStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: HashMap::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Point the store at a new data directory, dropping all cached tables.
    pub fn set_dir(&mut self, dir: impl Into<PathBuf>) {
        self.dir = dir.into();
        self.cache.clear();
    }

    /// Drop cached tables so the next access reloads from disk.
    pub fn invalidate(&mut self) {
        self.cache.clear();
    }

    /// Resolve the path of a dataset under the current directory.
    ///
    /// Some dataset dumps ship the ICMR file without an extension; fall back
    /// to the extensionless name when the `.csv` variant is absent.
    pub fn path_of(&self, dataset: Dataset) -> PathBuf {
        let path = self.dir.join(dataset.file_name());
        if dataset == Dataset::Testing && !path.is_file() {
            let bare = self.dir.join("ICMR_Testing_Data");
            if bare.is_file() {
                return bare;
            }
        }
        path
    }

    /// Read-through access: load the table on first use, then serve from cache.
    pub fn get(&mut self, dataset: Dataset) -> Result<&DataFrame, DataError> {
        let path = self.path_of(dataset);
        match self.cache.entry(dataset) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(slot) => Ok(slot.insert(dataset.load(&path)?)),
        }
    }

    /// Load all four tables from a directory in parallel.
    ///
    /// Used by the background loading thread to warm a store without blocking
    /// the UI; results are handed back via [`DataStore::install`].
    pub fn load_all(dir: &Path) -> Result<Vec<(Dataset, DataFrame)>, DataError> {
        let probe = DataStore::new(dir);
        let tables = Dataset::ALL
            .par_iter()
            .map(|ds| {
                let path = probe.path_of(*ds);
                ds.load(&path).map(|df| (*ds, df))
            })
            .collect::<Result<Vec<_>, _>>()?;
        info!(dir = %dir.display(), "loaded all datasets");
        Ok(tables)
    }

    /// Install preloaded tables into the cache.
    pub fn install(&mut self, tables: Vec<(Dataset, DataFrame)>) {
        for (dataset, df) in tables {
            self.cache.insert(dataset, df);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) {
        let mut f = std::fs::File::create(dir.join(name)).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    fn seed_data_dir(dir: &Path) {
        write_file(
            dir,
            "case_time_series.csv",
            "Date,Daily Confirmed\n2020-01-30,3\n2020-01-31,2\n",
        );
        write_file(
            dir,
            "state_wise.csv",
            "State,Confirmed,Recovered,Deaths\nKerala,100,90,1\nTotal,100,90,1\n",
        );
        write_file(
            dir,
            "ICMR_Testing_Data.csv",
            "day,totalSamplesTested,totalPositiveCases,positive_ratio\n13/03/2020,900,15,1.7\n",
        );
        write_file(
            dir,
            "HospitalBedsIndia.csv",
            "State/UT,NumPublicBeds_HMIS\nKerala,2000\n",
        );
    }

    #[test]
    fn read_through_get_loads_once() {
        let dir = tempfile::tempdir().unwrap();
        seed_data_dir(dir.path());

        let mut store = DataStore::new(dir.path());
        let rows = store.get(Dataset::CaseTimeSeries).unwrap().height();
        assert_eq!(rows, 2);

        // Removing the file must not matter: the table is cached.
        std::fs::remove_file(dir.path().join("case_time_series.csv")).unwrap();
        assert_eq!(store.get(Dataset::CaseTimeSeries).unwrap().height(), 2);

        // Until the cache is invalidated.
        store.invalidate();
        assert!(store.get(Dataset::CaseTimeSeries).is_err());
    }

    #[test]
    fn load_all_returns_all_four_tables() {
        let dir = tempfile::tempdir().unwrap();
        seed_data_dir(dir.path());

        let tables = DataStore::load_all(dir.path()).unwrap();
        assert_eq!(tables.len(), 4);

        let mut store = DataStore::new(dir.path());
        store.install(tables);
        assert!(store.get(Dataset::HospitalBeds).is_ok());
    }

    #[test]
    fn testing_path_falls_back_to_extensionless_name() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "ICMR_Testing_Data",
            "day,totalSamplesTested,totalPositiveCases,positive_ratio\n13/03/2020,900,15,1.7\n",
        );

        let mut store = DataStore::new(dir.path());
        assert_eq!(store.get(Dataset::Testing).unwrap().height(), 1);
    }
}
