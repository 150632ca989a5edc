//! Japanese text ordering for reference data, using CLDR collation for the
//! `ja` locale. Kanji order by reading, kana before kanji, and width or
//! kana-script variants only differ at the tertiary level.
use std::cmp::Ordering;

use anyhow::anyhow;
use icu_collator::{Collator, CollatorOptions};
use icu_locid::locale;

use crate::errors::AppError;

pub struct JaCollator {
    collator: Collator,
}

impl JaCollator {
    pub fn new() -> Result<Self, AppError> {
        let collator = Collator::try_new(&locale!("ja").into(), CollatorOptions::new())
            .map_err(|e| anyhow!("Failed to load ja collation data: {e}"))?;
        Ok(Self { collator })
    }

    /// Collation order; strings the collator ranks equal fall back to
    /// code-point order so sorting stays total.
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        self.collator.compare(a, b).then_with(|| a.cmp(b))
    }
}
