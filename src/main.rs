//! k5ktool: inspect and convert Kawai K5000 sound banks.
//!
//! Usage:
//!   k5ktool list bank.kaa
//!   k5ktool dump bank.kaa --patch 12 --format json
//!   k5ktool extract bank.kaa --patch 12 --output single.ka1
//!   k5ktool convert bank.kaa --to ka1 --output patches/
//!   k5ktool convert single.ka1 --to syx --output single.syx --bank D --slot 5
//!   k5ktool create --preset saw --envelope pluck --output saw.ka1
//!   k5ktool harmonics saw

mod report;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use k5k_formats::{
    decode_bank_with, decode_patch, decode_sysex_bank, encode_sysex_bank, extract_patch,
    DecodeOptions, SysExHeader,
};
use k5k_ir::{
    additive_patch, harmonic_envelope, harmonic_levels, preset, summarize, Bank, Patch,
    HARMONIC_ENVELOPES, PATCH_COUNT, PRESETS,
};

#[derive(Parser)]
#[command(name = "k5ktool", version, about = "Inspect and convert Kawai K5000 sound banks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the used patches of a bank
    List { file: PathBuf },
    /// Print decoded patch parameters
    Dump {
        /// Bank (.kaa), single patch (.ka1) or SysEx dump (.syx)
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
        /// Patch number (1-128); all used patches when omitted
        #[arg(long)]
        patch: Option<usize>,
        /// Warn about records whose stored checksum does not match
        #[arg(long)]
        verify_checksums: bool,
    },
    /// Write one patch as a standalone single-patch record
    Extract {
        file: PathBuf,
        /// Patch number (1-128)
        #[arg(long)]
        patch: usize,
        #[arg(long)]
        output: PathBuf,
    },
    /// Convert a bank or patch to single-patch files or a SysEx dump
    Convert {
        file: PathBuf,
        #[arg(long, value_enum)]
        to: Target,
        /// Directory for `ka1`, file for `syx`
        #[arg(long)]
        output: PathBuf,
        /// Slot (1-128) a single patch is placed in
        #[arg(long, default_value_t = 1)]
        slot: usize,
        /// SysEx bank letter
        #[arg(long, default_value = "A")]
        bank: String,
        /// SysEx MIDI channel (1-16)
        #[arg(long, default_value_t = 1)]
        channel: u8,
    },
    /// Create an additive single patch from a waveform preset
    Create {
        #[arg(long)]
        preset: String,
        /// Harmonic envelope applied to every harmonic
        #[arg(long, default_value = "pluck")]
        envelope: String,
        /// Patch name; the preset name when omitted
        #[arg(long)]
        name: Option<String>,
        /// PCM wave kit (1-342) for the second source
        #[arg(long, default_value_t = 1)]
        pcm_wave: u16,
        #[arg(long)]
        output: PathBuf,
    },
    /// Print the harmonic levels of a waveform preset
    Harmonics { preset: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum Target {
    /// One single-patch file per used patch
    Ka1,
    /// One SysEx block dump
    Syx,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::List { file } => {
            let bank = load_bank(&file, &DecodeOptions::default(), 1)?;
            print!("{}", report::patch_list(&bank));
            println!();
            print!("{}", summarize(&bank));
        }
        Command::Dump {
            file,
            format,
            patch,
            verify_checksums,
        } => {
            let options = DecodeOptions { verify_checksums };
            let bank = load_bank(&file, &options, 1)?;
            let selected: Vec<(usize, &Patch)> = match patch {
                Some(number) => {
                    let patch = select_patch(&bank, number)?;
                    vec![(number - 1, patch)]
                }
                None => bank.used_patches().collect(),
            };
            match format {
                Format::Text => {
                    for (index, patch) in selected {
                        println!("{}", report::patch_report(index, patch));
                    }
                }
                Format::Json => {
                    let patches: Vec<&Patch> = selected.into_iter().map(|(_, p)| p).collect();
                    let json = serde_json::to_string_pretty(&patches)
                        .context("failed to serialize patches")?;
                    println!("{}", json);
                }
            }
        }
        Command::Extract {
            file,
            patch,
            output,
        } => {
            let bank = load_bank(&file, &DecodeOptions::default(), 1)?;
            write_file(&output, &extract_patch(select_patch(&bank, patch)?))?;
        }
        Command::Convert {
            file,
            to,
            output,
            slot,
            bank: bank_name,
            channel,
        } => {
            let bank = load_bank(&file, &DecodeOptions::default(), slot)?;
            match to {
                Target::Ka1 => {
                    fs::create_dir_all(&output)
                        .with_context(|| format!("failed to create {}", output.display()))?;
                    for (index, patch) in bank.used_patches() {
                        write_file(&output.join(patch_file_name(index, patch)), &extract_patch(patch))?;
                    }
                }
                Target::Syx => {
                    if !(1..=16).contains(&channel) {
                        bail!("MIDI channel {} out of range 1-16", channel);
                    }
                    let bank_id = SysExHeader::bank_id(&bank_name)
                        .ok_or_else(|| anyhow!("unknown bank '{}', expected A, B, D, E or F", bank_name))?;
                    let header = SysExHeader {
                        channel,
                        bank: bank_id,
                    };
                    write_file(&output, &encode_sysex_bank(&header, &bank))?;
                }
            }
        }
        Command::Create {
            preset: preset_name,
            envelope,
            name,
            pcm_wave,
            output,
        } => {
            let params = find_preset(&preset_name)?;
            let Some(envelope) = harmonic_envelope(&envelope) else {
                let known: Vec<&str> = HARMONIC_ENVELOPES.iter().map(|(n, _)| *n).collect();
                bail!("unknown envelope '{}', expected one of: {}", envelope, known.join(", "));
            };
            let name = name.unwrap_or(preset_name);
            let patch = additive_patch(&name, &harmonic_levels(&params), envelope, pcm_wave)
                .ok_or_else(|| anyhow!("PCM wave kit {} out of range", pcm_wave))?;
            write_file(&output, &extract_patch(&patch))?;
        }
        Command::Harmonics { preset: name } => {
            let params = find_preset(&name)?;
            print!("{}", report::harmonic_table(&harmonic_levels(&params)));
        }
    }

    Ok(())
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// Read and decode a bank. `.syx` files are read as block dumps and `.ka1`
/// files as a single patch placed in `single_slot` (1-128).
fn load_bank(path: &Path, options: &DecodeOptions, single_slot: usize) -> Result<Bank> {
    let data = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;

    if has_extension(path, "syx") {
        let (header, bank) = decode_sysex_bank(&data)
            .with_context(|| format!("failed to decode SysEx dump {}", path.display()))?;
        tracing::info!(
            channel = header.channel,
            bank = header.bank_name().unwrap_or("?"),
            "SysEx block dump"
        );
        Ok(bank)
    } else if has_extension(path, "ka1") {
        if !(1..=PATCH_COUNT).contains(&single_slot) {
            bail!("slot {} out of range 1-{}", single_slot, PATCH_COUNT);
        }
        let patch = decode_patch(&data)
            .with_context(|| format!("failed to decode patch {}", path.display()))?;
        let mut bank = Bank::default();
        bank.patches[single_slot - 1] = patch;
        Ok(bank)
    } else {
        decode_bank_with(&data, options)
            .with_context(|| format!("failed to decode bank {}", path.display()))
    }
}

fn select_patch(bank: &Bank, number: usize) -> Result<&Patch> {
    if !(1..=PATCH_COUNT).contains(&number) {
        bail!("patch number {} out of range 1-{}", number, PATCH_COUNT);
    }
    let patch = &bank.patches[number - 1];
    if !patch.is_used() {
        bail!("patch {} is empty", number);
    }
    Ok(patch)
}

fn find_preset(name: &str) -> Result<k5k_ir::WaveformParameters> {
    preset(name).ok_or_else(|| {
        let known: Vec<&str> = PRESETS.iter().map(|(n, _)| *n).collect();
        anyhow!("unknown preset '{}', expected one of: {}", name, known.join(", "))
    })
}

fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    fs::write(path, data).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(bytes = data.len(), path = %path.display(), "wrote file");
    Ok(())
}

/// `NNN-Name.ka1`, with characters unsafe in file names replaced.
fn patch_file_name(index: usize, patch: &Patch) -> String {
    let name: String = patch
        .name()
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    if name.is_empty() {
        format!("{:03}.ka1", index + 1)
    } else {
        format!("{:03}-{}.ka1", index + 1, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_file_names_are_numbered() {
        let mut patch = Patch::default();
        patch.common.set_name("Pad/Vox ");
        assert_eq!(patch_file_name(4, &patch), "005-Pad_Vox.ka1");
        assert_eq!(patch_file_name(127, &Patch::default()), "128.ka1");
    }
}
