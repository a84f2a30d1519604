//! # Binary Images
//!
//! Programs and data reach the traced address space as flat binary files,
//! each placed at a 16-bit load address. [`MemoryMap`] collects the images,
//! rejects any that overlap or run past `$FFFF`, and builds the
//! [`MemorySpace`]:
//!
//! - each read-only image becomes a ROM block of its own size
//! - the address ranges between ROM blocks become RAM blocks, pre-loaded
//!   with the writable images that fall inside them
//!
//! The result always covers all 64KB, so a traced program never faults on
//! an address just because no image was loaded there.

use std::fs;
use std::path::Path;

use log::{debug, info};

use crate::error::ConfigError;
use crate::memory::{BlockSpec, MemorySpace};
use crate::number::parse_number;

const ADDRESS_SPACE: u32 = 0x10000;

/// Parses a load address: decimal, `0x`-prefixed hex or `$`-prefixed hex.
///
/// # Examples
///
/// ```
/// use trace6502::loader::parse_address;
///
/// assert_eq!(parse_address("$0800").unwrap(), 0x0800);
/// assert_eq!(parse_address("0xD000").unwrap(), 0xD000);
/// assert_eq!(parse_address("2048").unwrap(), 2048);
/// assert!(parse_address("$10000").is_err());
/// ```
pub fn parse_address(text: &str) -> Result<u16, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidAddress {
        text: text.to_string(),
        reason,
    };

    let value = parse_number(text).map_err(invalid)?;
    u16::try_from(value).map_err(|_| invalid("larger than $FFFF".to_string()))
}

/// Reads a whole binary file.
pub fn read_image(path: &Path) -> Result<Vec<u8>, ConfigError> {
    fs::read(path).map_err(|err| ConfigError::io(path, err))
}

/// A binary image placed in the address space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    /// Shown in messages, usually the file path
    pub name: String,
    pub address: u16,
    pub data: Vec<u8>,
    pub readonly: bool,
}

impl Image {
    /// One past the last byte, as a 17-bit value.
    fn end(&self) -> u32 {
        self.address as u32 + self.data.len() as u32
    }
}

/// Collects images and composes them into a [`MemorySpace`].
///
/// # Examples
///
/// ```
/// use trace6502::loader::{Image, MemoryMap};
///
/// let mut map = MemoryMap::new();
/// map.add(Image {
///     name: "code".to_string(),
///     address: 0x0800,
///     data: vec![0xA9, 0x01, 0x00],
///     readonly: false,
/// })
/// .unwrap();
///
/// let memory = map.build().unwrap();
/// assert_eq!(memory.read(0x0800).unwrap(), 0xA9);
/// assert!(memory.contains(0xFFFF));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryMap {
    images: Vec<Image>,
}

impl MemoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an image.
    ///
    /// # Errors
    ///
    /// - `ConfigError::EmptyImage` for an image with no bytes
    /// - `ConfigError::ImageTooLarge` if the image runs past `$FFFF`
    /// - `ConfigError::ImageOverlap` if it shares an address with an earlier image
    pub fn add(&mut self, image: Image) -> Result<(), ConfigError> {
        if image.data.is_empty() {
            return Err(ConfigError::EmptyImage { name: image.name });
        }

        if image.end() > ADDRESS_SPACE {
            return Err(ConfigError::ImageTooLarge {
                name: image.name,
                address: image.address,
                length: image.data.len(),
            });
        }

        if let Some(other) = self
            .images
            .iter()
            .find(|other| (image.address as u32) < other.end() && image.end() > other.address as u32)
        {
            return Err(ConfigError::ImageOverlap {
                name: image.name,
                address: image.address,
                other: other.name.clone(),
                other_address: other.address,
            });
        }

        info!(
            "{} image {} at ${:04X} ({} bytes)",
            if image.readonly { "read-only" } else { "data" },
            image.name,
            image.address,
            image.data.len()
        );

        self.images.push(image);
        Ok(())
    }

    /// Reads `path` and adds it at `address`.
    pub fn load(&mut self, path: &Path, address: u16, readonly: bool) -> Result<(), ConfigError> {
        let data = read_image(path)?;
        self.add(Image {
            name: path.display().to_string(),
            address,
            data,
            readonly,
        })
    }

    /// Images in the order they were added.
    pub fn images(&self) -> &[Image] {
        &self.images
    }

    /// Builds the address space: ROM blocks for read-only images, RAM for
    /// everything else.
    pub fn build(&self) -> Result<MemorySpace, ConfigError> {
        let mut roms: Vec<&Image> = self.images.iter().filter(|i| i.readonly).collect();
        roms.sort_by_key(|i| i.address);

        let mut specs = Vec::new();
        let mut cursor = 0u32;

        for rom in roms {
            if (rom.address as u32) > cursor {
                specs.push(self.ram_block(cursor, rom.address as u32));
            }
            specs.push(BlockSpec::rom(rom.address, rom.data.len()).with_data(rom.data.clone()));
            cursor = rom.end();
        }

        if cursor < ADDRESS_SPACE {
            specs.push(self.ram_block(cursor, ADDRESS_SPACE));
        }

        for spec in &specs {
            debug!(
                "{} block ${:04X}-${:04X}",
                if spec.readonly { "ROM" } else { "RAM" },
                spec.start,
                spec.start as u32 + spec.length as u32 - 1
            );
        }

        Ok(MemorySpace::new(specs)?)
    }

    /// RAM covering `[start, end)` holding every writable image inside it.
    fn ram_block(&self, start: u32, end: u32) -> BlockSpec {
        let mut bytes = vec![0; (end - start) as usize];

        for image in self.images.iter().filter(|i| !i.readonly) {
            let address = image.address as u32;
            if address >= start && image.end() <= end {
                let offset = (address - start) as usize;
                bytes[offset..offset + image.data.len()].copy_from_slice(&image.data);
            }
        }

        BlockSpec::ram(start as u16, bytes.len()).with_data(bytes)
    }
}
