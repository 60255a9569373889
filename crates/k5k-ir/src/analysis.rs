//! Bank analysis: scans a Bank to report how its pool is used.

use std::collections::BTreeSet;
use std::fmt;

use crate::bank::{Bank, POOL_SIZE};

/// Summary of what a bank contains.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BankSummary {
    pub patch_count: usize,
    pub pool_bytes_used: usize,
    pub total_sources: usize,
    pub additive_sources: usize,
    pub pcm_sources: usize,
    /// Effect table indices used by any patch
    pub effect_types: BTreeSet<u8>,
    pub reverb_types: BTreeSet<u8>,
    pub source_count_range: Option<(usize, usize)>,
}

/// Analyze a bank and summarize its contents.
pub fn summarize(bank: &Bank) -> BankSummary {
    let mut summary = BankSummary::default();

    for (_, patch) in bank.used_patches() {
        summary.patch_count += 1;
        summary.pool_bytes_used += patch.record_size();

        let n = patch.sources.len();
        summary.total_sources += n;
        summary.source_count_range = Some(match summary.source_count_range {
            Some((lo, hi)) => (lo.min(n), hi.max(n)),
            None => (n, n),
        });

        for source in &patch.sources {
            if source.is_additive() {
                summary.additive_sources += 1;
            } else {
                summary.pcm_sources += 1;
            }
        }

        for effect in &patch.common.effects {
            summary.effect_types.insert(effect.effect_type());
        }
        summary.reverb_types.insert(patch.common.reverb.kind);
    }

    summary
}

impl BankSummary {
    pub fn pool_usage_percent(&self) -> f64 {
        self.pool_bytes_used as f64 * 100.0 / POOL_SIZE as f64
    }
}

impl fmt::Display for BankSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Patches:  {} used", self.patch_count)?;
        writeln!(
            f,
            "Pool:     {} of {} bytes ({:.1}%)",
            self.pool_bytes_used,
            POOL_SIZE,
            self.pool_usage_percent(),
        )?;
        writeln!(
            f,
            "Sources:  {} total, {} ADD, {} PCM",
            self.total_sources, self.additive_sources, self.pcm_sources,
        )?;
        if let Some((lo, hi)) = self.source_count_range {
            writeln!(f, "Per patch: {} - {} sources", lo, hi)?;
        }

        if self.effect_types.is_empty() {
            writeln!(f, "Effects:  (none)")?;
        } else {
            let names: Vec<String> = self
                .effect_types
                .iter()
                .map(|&i| match crate::names::effect_info(i) {
                    Ok(info) => info.name.to_string(),
                    Err(_) => format!("unknown ({})", i),
                })
                .collect();
            writeln!(f, "Effects:  {}", names.join(", "))?;
        }

        if !self.reverb_types.is_empty() {
            let names: Vec<String> = self
                .reverb_types
                .iter()
                .map(|&i| match crate::names::reverb_info(i) {
                    Ok(info) => info.name.to_string(),
                    Err(_) => format!("unknown ({})", i),
                })
                .collect();
            writeln!(f, "Reverbs:  {}", names.join(", "))?;
        }

        Ok(())
    }
}
