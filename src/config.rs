//! Session configuration: which listing, which images, where to start.
//!
//! [`SessionConfig`] only names inputs. [`Session::open`] checks that every
//! named file exists, then loads the images, parses the listing and settles
//! the entry address. Nothing is parsed if any input is missing.

use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::cycles::CycleTable;
use crate::error::ConfigError;
use crate::listing::{acme, ca65, Listing};
use crate::loader::MemoryMap;
use crate::memory::MemorySpace;
use crate::processor::Processor;
use crate::trace::TraceController;

/// Entry address used when neither the command line nor the listing gives one.
pub const DEFAULT_ENTRY: u16 = 0x0800;

/// Where the listing comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingSource {
    /// ACME report (`acme -r`).
    Acme { report: PathBuf },

    /// ca65 listing (`ca65 --listing`) with its ld65 map (`ld65 --mapfile`).
    Ca65 { listing: PathBuf, map: PathBuf },
}

impl ListingSource {
    fn paths(&self) -> Vec<&Path> {
        match self {
            ListingSource::Acme { report } => vec![report.as_path()],
            ListingSource::Ca65 { listing, map } => vec![listing.as_path(), map.as_path()],
        }
    }
}

/// A binary file to place in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSpec {
    pub path: PathBuf,
    pub address: u16,

    /// Load as ROM instead of RAM
    pub readonly: bool,
}

/// Everything needed to start tracing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub listing: ListingSource,
    pub images: Vec<ImageSpec>,

    /// Overrides the listing's entry address
    pub entry: Option<u16>,

    /// Ceiling for looping step operations
    pub step_limit: Option<u64>,
}

impl SessionConfig {
    /// A configuration with no images, no entry override and no ceiling.
    pub fn new(listing: ListingSource) -> Self {
        Self {
            listing,
            images: Vec::new(),
            entry: None,
            step_limit: None,
        }
    }

    /// Checks that every input file exists.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let images = self.images.iter().map(|image| image.path.as_path());

        match self.listing.paths().into_iter().chain(images).find(|p| !p.is_file()) {
            Some(path) => Err(ConfigError::MissingFile {
                path: path.to_path_buf(),
            }),
            None => Ok(()),
        }
    }
}

/// Loaded inputs, ready to hand to a processor.
#[derive(Debug, Clone)]
pub struct Session {
    pub memory: MemorySpace,
    pub listing: Listing,
    pub entry: u16,
    pub step_limit: Option<u64>,

    /// Table the listing was annotated with
    pub cycle_table: CycleTable,
}

impl Session {
    /// Opens a session with the NMOS cycle table.
    pub fn open(config: &SessionConfig) -> Result<Self, ConfigError> {
        Self::open_with_table(config, &CycleTable::nmos())
    }

    /// Opens a session, annotating the listing with `table`.
    ///
    /// The entry address is the configured override, else the listing's
    /// own, else [`DEFAULT_ENTRY`].
    pub fn open_with_table(config: &SessionConfig, table: &CycleTable) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut map = MemoryMap::new();
        for image in &config.images {
            map.load(&image.path, image.address, image.readonly)?;
        }
        let memory = map.build()?;

        let listing = match &config.listing {
            ListingSource::Acme { report } => acme::parse_file(report, table)?,
            ListingSource::Ca65 { listing, map } => ca65::parse_files(listing, map, table)?,
        };

        let entry = match (config.entry, listing.default_entry_address()) {
            (Some(entry), _) => entry,
            (None, Some(entry)) => {
                debug!("using entry address from listing");
                entry
            }
            (None, None) => DEFAULT_ENTRY,
        };
        info!("PC set to ${:04X}", entry);

        Ok(Self {
            memory,
            listing,
            entry,
            step_limit: config.step_limit,
            cycle_table: table.clone(),
        })
    }

    /// Builds a processor over the session memory and wraps it for tracing.
    pub fn into_tracer<P: Processor>(self, make: impl FnOnce(MemorySpace) -> P) -> TraceController<P> {
        let tracer = TraceController::new(make(self.memory), self.listing, self.entry)
            .with_cycle_table(self.cycle_table);

        match self.step_limit {
            Some(limit) => tracer.with_step_limit(limit),
            None => tracer,
        }
    }
}
