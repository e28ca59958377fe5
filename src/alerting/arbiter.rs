//! Reference-counted ownership of the shared wake-resource

use crate::category::{Category, PerCategory};
use crate::config::{FlashStyle, SCREEN_WAKE_DURATION};
use crate::error::{AlertError, Result};
use crate::platform::ResourceProvider;
use std::time::Instant;
use tracing::{debug, warn};

/// Shares one wake-resource between the three alert loops.
///
/// Each category holds at most one reference. The provider is asked to
/// acquire when the first holder arrives and to release when the last one
/// leaves; the holder count itself never depends on the provider succeeding.
pub struct ResourceArbiter {
    provider: Box<dyn ResourceProvider>,
    holders: PerCategory<bool>,
    physically_held: bool,
    /// Style and expiry of our own screen wake
    screen_wake: Option<(FlashStyle, Instant)>,
}

impl ResourceArbiter {
    pub fn new(provider: Box<dyn ResourceProvider>) -> Self {
        Self {
            provider,
            holders: PerCategory::default(),
            physically_held: false,
            screen_wake: None,
        }
    }

    pub fn holder_count(&self) -> usize {
        self.holders.iter().filter(|(_, held)| **held).count()
    }

    pub fn holds(&self, category: Category) -> bool {
        self.holders[category]
    }

    /// Whether the provider actually granted the resource
    pub fn is_resource_held(&self) -> bool {
        self.physically_held
    }

    /// Registers `category` as a holder. A provider failure is returned for
    /// logging but the reference is still counted; the next acquire retries.
    pub fn acquire(&mut self, category: Category) -> Result<()> {
        if self.holders[category] {
            debug!(category = %category, "Already holding wake-resource");
            return Ok(());
        }
        self.holders[category] = true;

        if self.physically_held {
            debug!(category = %category, holders = self.holder_count(), "Sharing wake-resource");
            return Ok(());
        }

        match self.provider.acquire() {
            Ok(()) => {
                self.physically_held = true;
                debug!(category = %category, "Wake-resource acquired");
                Ok(())
            }
            Err(e) => Err(AlertError::ResourceAcquisition(e.to_string())),
        }
    }

    /// Drops `category`'s reference. Releasing without holding is rejected
    /// and leaves the count untouched.
    pub fn release(&mut self, category: Category) -> Result<()> {
        if !self.holders[category] {
            return Err(AlertError::UnbalancedRelease(category));
        }
        self.holders[category] = false;

        if self.holder_count() == 0 && self.physically_held {
            self.physically_held = false;
            if let Err(e) = self.provider.release() {
                warn!(error = %e, "Wake-resource release failed");
            } else {
                debug!(category = %category, "Wake-resource released");
            }
        }
        Ok(())
    }

    /// Drops every reference and the resource itself
    pub fn release_all(&mut self) {
        for category in Category::ALL {
            if self.holders[category] {
                // only fails for non-holders, which we just skipped
                let _ = self.release(category);
            }
        }
        if self.physically_held {
            self.physically_held = false;
            if let Err(e) = self.provider.release() {
                warn!(error = %e, "Wake-resource release failed");
            }
        }
    }

    /// Wakes the screen for a flash. The provider is only asked again when
    /// the style changes or our previous wake has run out.
    pub fn flash_screen(&mut self, style: FlashStyle, now: Instant) -> Result<()> {
        if let Some((current, until)) = self.screen_wake {
            if current == style && now < until {
                return Ok(());
            }
        }
        self.provider
            .acquire_screen_wake(style, SCREEN_WAKE_DURATION)
            .map_err(|e| AlertError::ResourceAcquisition(e.to_string()))?;
        self.screen_wake = Some((style, now + SCREEN_WAKE_DURATION));
        Ok(())
    }

    /// Screen is on and not because of our own flash
    pub fn user_is_looking(&self, now: Instant) -> bool {
        let our_flash = matches!(self.screen_wake, Some((_, until)) if now < until);
        self.provider.is_screen_on() && !our_flash
    }
}
