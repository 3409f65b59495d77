//! Persistent settings in the nRF52840's internal flash.
//!
//! The settings record lives in a `sequential-storage` key-value map over
//! the last two flash pages (reserved in `memory.x`). The map handles
//! page erasure and wear levelling; we only ever store a single key.
//!
//! Flash is written only when the user picks "Save" in the setup menu.

use blinkenlights::config::{STORAGE_FLASH_PAGE_COUNT, STORAGE_FLASH_PAGE_START};
use blinkenlights::error::Error;
use blinkenlights::settings::{Settings, SETTINGS_RECORD_SIZE};
use defmt::{error, info};
use embedded_storage_async::nor_flash::NorFlash;
use sequential_storage::cache::NoCache;
use sequential_storage::map::{fetch_item, store_item};

/// Flash page size for nRF52840 (4 KB).
const FLASH_PAGE_SIZE: u32 = 4096;

/// Start address of our storage region.
const STORAGE_START: u32 = STORAGE_FLASH_PAGE_START * FLASH_PAGE_SIZE;

/// End address (exclusive) of our storage region.
const STORAGE_END: u32 = (STORAGE_FLASH_PAGE_START + STORAGE_FLASH_PAGE_COUNT) * FLASH_PAGE_SIZE;

/// Key of the settings record in the map.
const KEY_SETTINGS: u8 = 0x01;

/// Scratch buffer for map operations (record plus item header).
const BUF_SIZE: usize = 64;

/// Owns the flash driver and reads/writes the settings record.
pub struct SettingsStore<F> {
    flash: F,
}

impl<F: NorFlash> SettingsStore<F> {
    pub fn new(flash: F) -> Self {
        Self { flash }
    }

    /// Load the stored settings. Missing or unreadable records give the
    /// factory defaults.
    pub async fn load(&mut self) -> Settings {
        let mut buf = [0u8; BUF_SIZE];

        match fetch_item::<u8, &[u8], _>(
            &mut self.flash,
            STORAGE_START..STORAGE_END,
            &mut NoCache::new(),
            &mut buf,
            &KEY_SETTINGS,
        )
        .await
        {
            Ok(Some(data)) => {
                info!("Settings: loaded {} bytes from flash", data.len());
                Settings::decode_or_default(Some(data))
            }
            Ok(None) => {
                info!("Settings: nothing stored, using defaults");
                Settings::default()
            }
            Err(e) => {
                error!("Flash read error: {:?}", defmt::Debug2Format(&e));
                Settings::default()
            }
        }
    }

    /// Persist `settings`.
    pub async fn save(&mut self, settings: &Settings) -> Result<(), Error> {
        let mut buf = [0u8; BUF_SIZE];
        let mut record = [0u8; SETTINGS_RECORD_SIZE];
        let len = settings.encode(&mut record);
        let item: &[u8] = &record[..len];

        store_item::<u8, &[u8], _>(
            &mut self.flash,
            STORAGE_START..STORAGE_END,
            &mut NoCache::new(),
            &mut buf,
            &KEY_SETTINGS,
            &item,
        )
        .await
        .map_err(|e| {
            error!("Flash write error: {:?}", defmt::Debug2Format(&e));
            Error::Storage
        })?;

        info!("Settings: saved ({:?})", settings.mode);
        Ok(())
    }
}
