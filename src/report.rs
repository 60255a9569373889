//! Text rendering of decoded banks for the CLI.

use std::fmt::{self, Write};

use k5k_ir::{
    effect_info, filter_mode_name, lfo_waveform_name, polyphony_name, reverb_info, AdditiveKit,
    Bank, Common, OutOfRangeEnumeration, Patch, Source,
};

/// Table name, or `unknown (n)` for a value the table does not cover.
fn name_or_unknown(lookup: Result<&'static str, OutOfRangeEnumeration>, raw: u8) -> String {
    match lookup {
        Ok(name) => name.to_string(),
        Err(_) => format!("unknown ({})", raw),
    }
}

/// One line per used patch: number, name, source types, record size.
pub fn patch_list(bank: &Bank) -> String {
    let mut out = String::new();
    for (index, patch) in bank.used_patches() {
        let _ = writeln!(
            out,
            "{:3}  {:<8}  {}  {:5} bytes",
            index + 1,
            patch.name(),
            patch.source_types(),
            patch.record_size(),
        );
    }
    out
}

/// Full parameter dump of one patch.
pub fn patch_report(index: usize, patch: &Patch) -> String {
    let mut out = String::new();
    let _ = write_patch(&mut out, index, patch);
    out
}

fn write_patch(out: &mut String, index: usize, patch: &Patch) -> fmt::Result {
    writeln!(out, "Patch {:03}: {}", index + 1, patch.name())?;
    write_common(out, &patch.common)?;
    for (i, source) in patch.sources.iter().enumerate() {
        writeln!(out)?;
        let muted = if patch.common.source_mutes.is_muted(i) { " (muted)" } else { "" };
        writeln!(out, "Source {}{}", i + 1, muted)?;
        write_source(out, source)?;
        if let Some(kit) = patch.additive_kit(i) {
            write_additive_kit(out, kit)?;
        }
    }
    Ok(())
}

fn write_common(out: &mut String, common: &Common) -> fmt::Result {
    writeln!(out, "  Volume:     {}", common.volume)?;
    writeln!(
        out,
        "  Polyphony:  {}",
        name_or_unknown(polyphony_name(common.polyphony), common.polyphony)
    )?;
    writeln!(out, "  Sources:    {}", common.source_count)?;
    writeln!(out, "  Algorithm:  {}", common.effect_algorithm)?;

    let reverb = &common.reverb;
    match reverb_info(reverb.kind) {
        Ok(info) => {
            writeln!(out, "  Reverb:     {} (dry/wet {})", info.name, reverb.dry_wet)?;
            for (label, value) in info.params.iter().zip(reverb.params) {
                writeln!(out, "    {}: {}", label, value)?;
            }
        }
        Err(_) => writeln!(out, "  Reverb:     unknown ({})", reverb.kind)?,
    }

    for (i, effect) in common.effects.iter().enumerate() {
        let index = effect.effect_type();
        match effect_info(index) {
            Ok(info) => {
                let params: Vec<String> = info
                    .params
                    .iter()
                    .zip(effect.params)
                    .map(|(label, value)| format!("{} {}", label, value))
                    .collect();
                writeln!(
                    out,
                    "  Effect {}:   {} (depth {}) {}",
                    i + 1,
                    info.name,
                    effect.depth,
                    params.join(", ")
                )?;
            }
            Err(_) => writeln!(out, "  Effect {}:   unknown ({})", i + 1, index)?,
        }
    }

    let bands: Vec<String> = common.geq.bands.iter().map(|b| format!("{:+}", b)).collect();
    writeln!(out, "  GEQ:        {}", bands.join(" "))?;
    writeln!(
        out,
        "  Portamento: {} (speed {})",
        if common.portamento.enabled { "on" } else { "off" },
        common.portamento.speed
    )
}

fn write_source(out: &mut String, source: &Source) -> fmt::Result {
    let osc = &source.oscillator;
    let wave = if osc.is_additive() {
        "ADD".to_string()
    } else {
        format!("PCM {}", osc.wave_kit)
    };
    writeln!(out, "  Zone:       {} - {}", source.zone_low, source.zone_high)?;
    writeln!(out, "  Volume:     {}", source.volume)?;
    writeln!(out, "  Wave:       {}", wave)?;
    writeln!(out, "  Coarse:     {:+}  Fine: {:+}", osc.coarse, osc.fine)?;

    let filter = &source.filter;
    if filter.bypass {
        writeln!(out, "  Filter:     bypass")?;
    } else {
        writeln!(
            out,
            "  Filter:     {} cutoff {} resonance {}",
            name_or_unknown(filter_mode_name(filter.mode), filter.mode),
            filter.cutoff,
            filter.resonance
        )?;
    }

    let env = &source.amplifier.envelope;
    writeln!(
        out,
        "  Amp env:    A {} D1 {}/{} D2 {}/{} R {}",
        env.attack_time,
        env.decay1_time,
        env.decay1_level,
        env.decay2_time,
        env.decay2_level,
        env.release_time
    )?;

    let lfo = &source.lfo;
    writeln!(
        out,
        "  LFO:        {} speed {}",
        name_or_unknown(lfo_waveform_name(lfo.waveform), lfo.waveform),
        lfo.speed
    )
}

fn write_additive_kit(out: &mut String, kit: &AdditiveKit) -> fmt::Result {
    writeln!(out, "  MORF:       {}", if kit.morf { "on" } else { "off" })?;
    if let Some(harmonic) = kit.strongest_harmonic() {
        writeln!(
            out,
            "  Strongest:  harmonic {} at {}",
            harmonic + 1,
            kit.levels_low[harmonic]
        )?;
    }
    let looping = kit.envelopes.iter().filter(|e| e.is_looping()).count();
    writeln!(out, "  Looping:    {} harmonic envelopes", looping)
}

/// Harmonic levels, eight per row.
pub fn harmonic_table(levels: &[u8]) -> String {
    let mut out = String::new();
    for (row, chunk) in levels.chunks(8).enumerate() {
        let cells: Vec<String> = chunk.iter().map(|l| format!("{:3}", l)).collect();
        let _ = writeln!(out, "{:2}: {}", row * 8 + 1, cells.join(" "));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use k5k_ir::{EffectKind, ADD_WAVE_KIT};

    fn patch() -> Patch {
        let mut patch = Patch::default();
        let _ = patch.common.name.try_push_str("Strings");
        patch.common.source_count = 2;
        patch.common.effects[0].kind = EffectKind::Type(6);
        for wave in [42, ADD_WAVE_KIT] {
            let mut source = Source::default();
            source.oscillator.wave_kit = wave;
            patch.sources.push(source);
        }
        patch.additive_kits.push(AdditiveKit::default());
        patch.additive_slots[1] = true;
        patch
    }

    #[test]
    fn list_shows_used_slots_only() {
        let mut bank = Bank::default();
        bank.patches[2] = patch();
        let text = patch_list(&bank);
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("  3  Strings"));
        assert!(text.contains("PA----"));
        assert!(text.contains(&format!("{} bytes", 82 + 2 * 86 + 806)));
    }

    #[test]
    fn report_names_enumerations() {
        let text = patch_report(0, &patch());
        assert!(text.starts_with("Patch 001: Strings"));
        assert!(text.contains("Stereo Delay"));
        assert!(text.contains("Hall 1"));
        assert!(text.contains("PCM 42"));
        assert!(text.contains("Wave:       ADD"));
        assert!(text.contains("MORF:"));
    }

    #[test]
    fn unknown_values_are_reported_not_rejected() {
        let mut p = patch();
        p.common.reverb.kind = 40;
        p.common.polyphony = 9;
        p.common.effects[1].kind = EffectKind::Type(200);
        let text = patch_report(0, &p);
        assert!(text.contains("Reverb:     unknown (40)"));
        assert!(text.contains("Polyphony:  unknown (9)"));
        assert!(text.contains("Effect 2:   unknown (200)"));
    }

    #[test]
    fn harmonic_table_has_eight_rows() {
        let levels = [127u8; 64];
        let text = harmonic_table(&levels);
        assert_eq!(text.lines().count(), 8);
        assert!(text.lines().nth(1).unwrap().starts_with(" 9:"));
    }
}
