//! Field codec: byte cursor, biased values, and the parameter groups that
//! the common, source and additive records share.

use k5k_ir::{
    Amplifier, AmplifierEnvelope, ControlAssignment, ControllerPair, Effect, EffectKind,
    EnvelopeSegment, Filter, FilterEnvelope, FilterKeyScaling, FilterVelocity, FormantEnvelope,
    FormantLfo, FormantParams, Geq, HarmonicCopy, HarmonicEnvelope, HarmonicParams,
    KeyScalingModifier, Lfo, LfoDepth, ModulationTarget, MorfEnvelope, Oscillator, PitchEnvelope,
    Reverb, VelocityModifier, GEQ_BANDS,
};

use crate::FormatError;

/// Bias for values stored as 0-127 around a center of 64.
pub(crate) const BIAS_64: u8 = 64;
/// Bias for modulation depths (-31..+31 around 32).
pub(crate) const BIAS_32: u8 = 32;

/// Raw effect type bytes start here; raw 0 is "off".
const EFFECT_TYPE_BASE: u8 = 11;

/// Decode a byte stored with a fixed offset into a signed value.
///
/// Wrapping on both sides makes this a bijection over all 256 byte values,
/// so decode then [`encode_biased`] always gives the byte back.
pub fn decode_biased(byte: u8, bias: u8) -> i8 {
    byte.wrapping_sub(bias) as i8
}

/// Inverse of [`decode_biased`].
pub fn encode_biased(value: i8, bias: u8) -> u8 {
    (value as u8).wrapping_add(bias)
}

/// Cursor over a byte slice with bounds-checked reads.
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    fn check(&self, n: usize) -> Result<(), FormatError> {
        if self.pos + n > self.data.len() {
            return Err(FormatError::TruncatedBuffer {
                needed: self.pos + n,
                available: self.data.len(),
            });
        }
        Ok(())
    }

    pub fn skip(&mut self, n: usize) -> Result<(), FormatError> {
        self.check(n)?;
        self.pos += n;
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, FormatError> {
        self.check(1)?;
        let v = self.data[self.pos];
        self.pos += 1;
        Ok(v)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], FormatError> {
        self.check(n)?;
        let v = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(v)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], FormatError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_biased(&mut self, bias: u8) -> Result<i8, FormatError> {
        Ok(decode_biased(self.read_u8()?, bias))
    }

    /// A switch byte: on only when exactly 1.
    ///
    /// Lossy for anything but 0 and 1: other bytes read as off and are
    /// written back as 0.
    pub fn read_flag(&mut self) -> Result<bool, FormatError> {
        Ok(self.read_u8()? == 1)
    }

    /// A stored zero-based value surfaced one-based.
    pub fn read_one_based(&mut self) -> Result<u8, FormatError> {
        Ok(self.read_u8()?.wrapping_add(1))
    }
}

/// Growable output buffer, the writing side of [`ByteReader`].
#[derive(Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: Vec::with_capacity(capacity) }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_bytes(&mut self, v: &[u8]) {
        self.buf.extend_from_slice(v);
    }

    pub fn write_biased(&mut self, v: i8, bias: u8) {
        self.write_u8(encode_biased(v, bias));
    }

    pub fn write_flag(&mut self, v: bool) {
        self.write_u8(v as u8);
    }

    pub fn write_one_based(&mut self, v: u8) {
        self.write_u8(v.wrapping_sub(1));
    }

    /// Pad with zeros up to `len` bytes.
    pub fn pad_to(&mut self, len: usize) {
        if self.buf.len() < len {
            self.buf.resize(len, 0);
        }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

// --- Common groups ---

pub(crate) fn decode_reverb(r: &mut ByteReader) -> Result<Reverb, FormatError> {
    Ok(Reverb {
        kind: r.read_u8()?,
        dry_wet: r.read_u8()?,
        params: r.read_array()?,
    })
}

pub(crate) fn encode_reverb(w: &mut ByteWriter, reverb: &Reverb) {
    w.write_u8(reverb.kind);
    w.write_u8(reverb.dry_wet);
    w.write_bytes(&reverb.params);
}

fn effect_kind(raw: u8) -> EffectKind {
    match raw {
        0 => EffectKind::Off,
        n => EffectKind::Type(n.wrapping_sub(EFFECT_TYPE_BASE)),
    }
}

fn effect_raw(kind: EffectKind) -> u8 {
    match kind {
        EffectKind::Off => 0,
        EffectKind::Type(n) => n.wrapping_add(EFFECT_TYPE_BASE),
    }
}

pub(crate) fn decode_effect(r: &mut ByteReader) -> Result<Effect, FormatError> {
    Ok(Effect {
        kind: effect_kind(r.read_u8()?),
        depth: r.read_u8()?,
        params: r.read_array()?,
    })
}

pub(crate) fn encode_effect(w: &mut ByteWriter, effect: &Effect) {
    w.write_u8(effect_raw(effect.kind));
    w.write_u8(effect.depth);
    w.write_bytes(&effect.params);
}

pub(crate) fn decode_geq(r: &mut ByteReader) -> Result<Geq, FormatError> {
    let mut bands = [0i8; GEQ_BANDS];
    for band in &mut bands {
        *band = r.read_biased(BIAS_64)?;
    }
    Ok(Geq { bands })
}

pub(crate) fn encode_geq(w: &mut ByteWriter, geq: &Geq) {
    for &band in &geq.bands {
        w.write_biased(band, BIAS_64);
    }
}

pub(crate) fn decode_target(r: &mut ByteReader) -> Result<ModulationTarget, FormatError> {
    Ok(ModulationTarget {
        destination: r.read_u8()?,
        depth: r.read_biased(BIAS_32)?,
    })
}

pub(crate) fn encode_target(w: &mut ByteWriter, target: &ModulationTarget) {
    w.write_u8(target.destination);
    w.write_biased(target.depth, BIAS_32);
}

pub(crate) fn decode_assignment(r: &mut ByteReader) -> Result<ControlAssignment, FormatError> {
    Ok(ControlAssignment {
        source: r.read_u8()?,
        target: decode_target(r)?,
    })
}

pub(crate) fn encode_assignment(w: &mut ByteWriter, assignment: &ControlAssignment) {
    w.write_u8(assignment.source);
    encode_target(w, &assignment.target);
}

pub(crate) fn decode_controller(r: &mut ByteReader) -> Result<ControllerPair, FormatError> {
    Ok(ControllerPair {
        target1: decode_target(r)?,
        target2: decode_target(r)?,
    })
}

pub(crate) fn encode_controller(w: &mut ByteWriter, pair: &ControllerPair) {
    encode_target(w, &pair.target1);
    encode_target(w, &pair.target2);
}

// --- Source groups ---

pub(crate) fn decode_pitch_envelope(r: &mut ByteReader) -> Result<PitchEnvelope, FormatError> {
    Ok(PitchEnvelope {
        start_level: r.read_biased(BIAS_64)?,
        attack_time: r.read_u8()?,
        attack_level: r.read_biased(BIAS_64)?,
        decay_time: r.read_u8()?,
        time_velocity: r.read_biased(BIAS_64)?,
        level_velocity: r.read_biased(BIAS_64)?,
    })
}

pub(crate) fn encode_pitch_envelope(w: &mut ByteWriter, env: &PitchEnvelope) {
    w.write_biased(env.start_level, BIAS_64);
    w.write_u8(env.attack_time);
    w.write_biased(env.attack_level, BIAS_64);
    w.write_u8(env.decay_time);
    w.write_biased(env.time_velocity, BIAS_64);
    w.write_biased(env.level_velocity, BIAS_64);
}

/// Wave kit number from its MSB/LSB pair, 1-based.
pub(crate) fn wave_kit(msb: u8, lsb: u8) -> u16 {
    ((msb as u16) << 7) + lsb as u16 + 1
}

/// Inverse of [`wave_kit`] for 7-bit MSB/LSB pairs. A stored LSB above 0x7F
/// carries into the MSB and is not reproduced.
pub(crate) fn wave_kit_bytes(kit: u16) -> (u8, u8) {
    let raw = kit.wrapping_sub(1);
    ((raw >> 7) as u8, (raw & 0x7F) as u8)
}

pub(crate) fn decode_oscillator(r: &mut ByteReader) -> Result<Oscillator, FormatError> {
    let msb = r.read_u8()?;
    let lsb = r.read_u8()?;
    Ok(Oscillator {
        wave_kit: wave_kit(msb, lsb),
        coarse: r.read_biased(BIAS_64)?,
        fine: r.read_biased(BIAS_64)?,
        fixed_key: r.read_u8()?,
        key_scaling_pitch: r.read_u8()?,
        envelope: decode_pitch_envelope(r)?,
    })
}

pub(crate) fn encode_oscillator(w: &mut ByteWriter, osc: &Oscillator) {
    let (msb, lsb) = wave_kit_bytes(osc.wave_kit);
    w.write_u8(msb);
    w.write_u8(lsb);
    w.write_biased(osc.coarse, BIAS_64);
    w.write_biased(osc.fine, BIAS_64);
    w.write_u8(osc.fixed_key);
    w.write_u8(osc.key_scaling_pitch);
    encode_pitch_envelope(w, &osc.envelope);
}

pub(crate) fn decode_filter(r: &mut ByteReader) -> Result<Filter, FormatError> {
    Ok(Filter {
        bypass: r.read_flag()?,
        mode: r.read_u8()?,
        velocity_curve: r.read_one_based()?,
        resonance: r.read_u8()?,
        level: r.read_u8()?,
        cutoff: r.read_u8()?,
        cutoff_key_scaling: r.read_biased(BIAS_64)?,
        cutoff_velocity: r.read_biased(BIAS_64)?,
        envelope_depth: r.read_biased(BIAS_64)?,
        envelope: FilterEnvelope {
            attack_time: r.read_u8()?,
            decay1_time: r.read_u8()?,
            decay1_level: r.read_biased(BIAS_64)?,
            decay2_time: r.read_u8()?,
            decay2_level: r.read_biased(BIAS_64)?,
            release_time: r.read_u8()?,
        },
        key_scaling: FilterKeyScaling {
            attack_time: r.read_biased(BIAS_64)?,
            decay1_time: r.read_biased(BIAS_64)?,
        },
        velocity: FilterVelocity {
            depth: r.read_biased(BIAS_64)?,
            attack_time: r.read_biased(BIAS_64)?,
            decay1_time: r.read_biased(BIAS_64)?,
        },
    })
}

pub(crate) fn encode_filter(w: &mut ByteWriter, filter: &Filter) {
    w.write_flag(filter.bypass);
    w.write_u8(filter.mode);
    w.write_one_based(filter.velocity_curve);
    w.write_u8(filter.resonance);
    w.write_u8(filter.level);
    w.write_u8(filter.cutoff);
    w.write_biased(filter.cutoff_key_scaling, BIAS_64);
    w.write_biased(filter.cutoff_velocity, BIAS_64);
    w.write_biased(filter.envelope_depth, BIAS_64);

    let env = &filter.envelope;
    w.write_u8(env.attack_time);
    w.write_u8(env.decay1_time);
    w.write_biased(env.decay1_level, BIAS_64);
    w.write_u8(env.decay2_time);
    w.write_biased(env.decay2_level, BIAS_64);
    w.write_u8(env.release_time);

    w.write_biased(filter.key_scaling.attack_time, BIAS_64);
    w.write_biased(filter.key_scaling.decay1_time, BIAS_64);

    w.write_biased(filter.velocity.depth, BIAS_64);
    w.write_biased(filter.velocity.attack_time, BIAS_64);
    w.write_biased(filter.velocity.decay1_time, BIAS_64);
}

pub(crate) fn decode_amplifier(r: &mut ByteReader) -> Result<Amplifier, FormatError> {
    Ok(Amplifier {
        velocity_curve: r.read_u8()?,
        envelope: AmplifierEnvelope {
            attack_time: r.read_u8()?,
            decay1_time: r.read_u8()?,
            decay1_level: r.read_u8()?,
            decay2_time: r.read_u8()?,
            decay2_level: r.read_u8()?,
            release_time: r.read_u8()?,
        },
        key_scaling: KeyScalingModifier {
            level: r.read_biased(BIAS_64)?,
            attack_time: r.read_biased(BIAS_64)?,
            decay1_time: r.read_biased(BIAS_64)?,
            release_time: r.read_biased(BIAS_64)?,
        },
        velocity: VelocityModifier {
            level: r.read_u8()?,
            attack_time: r.read_biased(BIAS_64)?,
            decay1_time: r.read_biased(BIAS_64)?,
            release_time: r.read_biased(BIAS_64)?,
        },
    })
}

pub(crate) fn encode_amplifier(w: &mut ByteWriter, amp: &Amplifier) {
    w.write_u8(amp.velocity_curve);

    let env = &amp.envelope;
    w.write_bytes(&[
        env.attack_time,
        env.decay1_time,
        env.decay1_level,
        env.decay2_time,
        env.decay2_level,
        env.release_time,
    ]);

    let ks = &amp.key_scaling;
    w.write_biased(ks.level, BIAS_64);
    w.write_biased(ks.attack_time, BIAS_64);
    w.write_biased(ks.decay1_time, BIAS_64);
    w.write_biased(ks.release_time, BIAS_64);

    let vel = &amp.velocity;
    w.write_u8(vel.level);
    w.write_biased(vel.attack_time, BIAS_64);
    w.write_biased(vel.decay1_time, BIAS_64);
    w.write_biased(vel.release_time, BIAS_64);
}

fn decode_lfo_depth(r: &mut ByteReader) -> Result<LfoDepth, FormatError> {
    Ok(LfoDepth {
        depth: r.read_u8()?,
        key_scaling: r.read_biased(BIAS_64)?,
    })
}

fn encode_lfo_depth(w: &mut ByteWriter, depth: &LfoDepth) {
    w.write_u8(depth.depth);
    w.write_biased(depth.key_scaling, BIAS_64);
}

pub(crate) fn decode_lfo(r: &mut ByteReader) -> Result<Lfo, FormatError> {
    Ok(Lfo {
        waveform: r.read_u8()?,
        speed: r.read_u8()?,
        delay_onset: r.read_u8()?,
        fade_in_time: r.read_u8()?,
        fade_in_to_speed: r.read_u8()?,
        vibrato: decode_lfo_depth(r)?,
        growl: decode_lfo_depth(r)?,
        tremolo: decode_lfo_depth(r)?,
    })
}

pub(crate) fn encode_lfo(w: &mut ByteWriter, lfo: &Lfo) {
    w.write_bytes(&[
        lfo.waveform,
        lfo.speed,
        lfo.delay_onset,
        lfo.fade_in_time,
        lfo.fade_in_to_speed,
    ]);
    encode_lfo_depth(w, &lfo.vibrato);
    encode_lfo_depth(w, &lfo.growl);
    encode_lfo_depth(w, &lfo.tremolo);
}

// --- Additive groups ---

pub(crate) fn decode_harmonic_params(r: &mut ByteReader) -> Result<HarmonicParams, FormatError> {
    let total_gain = r.read_u8()?;
    let group = r.read_u8()?;
    let key_scaling = r.read_biased(BIAS_64)?;
    let velocity_curve = r.read_one_based()?;
    let velocity_depth = r.read_u8()?;

    let mut copies = [HarmonicCopy::default(); 4];
    for copy in &mut copies {
        copy.patch = r.read_u8()?;
        copy.source = r.read_u8()?;
    }

    let morf_envelope = MorfEnvelope {
        times: r.read_array()?,
        loop_type: r.read_u8()?,
    };

    Ok(HarmonicParams {
        total_gain,
        group,
        key_scaling,
        velocity_curve,
        velocity_depth,
        copies,
        morf_envelope,
    })
}

pub(crate) fn encode_harmonic_params(w: &mut ByteWriter, h: &HarmonicParams) {
    w.write_u8(h.total_gain);
    w.write_u8(h.group);
    w.write_biased(h.key_scaling, BIAS_64);
    w.write_one_based(h.velocity_curve);
    w.write_u8(h.velocity_depth);
    for copy in &h.copies {
        w.write_u8(copy.patch);
        w.write_u8(copy.source);
    }
    w.write_bytes(&h.morf_envelope.times);
    w.write_u8(h.morf_envelope.loop_type);
}

pub(crate) fn decode_formant_params(r: &mut ByteReader) -> Result<FormantParams, FormatError> {
    let bias = r.read_biased(BIAS_64)?;
    let lfo_selected = r.read_flag()?;
    let envelope_depth = r.read_biased(BIAS_64)?;

    let mut rates = [0u8; 4];
    let mut levels = [0i8; 4];
    for i in 0..4 {
        rates[i] = r.read_u8()?;
        levels[i] = r.read_biased(BIAS_64)?;
    }
    let envelope = FormantEnvelope {
        rates,
        levels,
        loop_type: r.read_u8()?,
        velocity_sensitivity: r.read_biased(BIAS_64)?,
        key_scaling: r.read_biased(BIAS_64)?,
    };

    let lfo = FormantLfo {
        speed: r.read_u8()?,
        shape: r.read_u8()?,
        depth: r.read_u8()?,
    };

    Ok(FormantParams {
        bias,
        lfo_selected,
        envelope_depth,
        envelope,
        lfo,
    })
}

pub(crate) fn encode_formant_params(w: &mut ByteWriter, f: &FormantParams) {
    w.write_biased(f.bias, BIAS_64);
    w.write_flag(f.lfo_selected);
    w.write_biased(f.envelope_depth, BIAS_64);

    let env = &f.envelope;
    for i in 0..4 {
        w.write_u8(env.rates[i]);
        w.write_biased(env.levels[i], BIAS_64);
    }
    w.write_u8(env.loop_type);
    w.write_biased(env.velocity_sensitivity, BIAS_64);
    w.write_biased(env.key_scaling, BIAS_64);

    w.write_bytes(&[f.lfo.speed, f.lfo.shape, f.lfo.depth]);
}

const LEVEL_MASK: u8 = 0x3F;
const LOOP_BIT: u8 = 6;

pub(crate) fn decode_harmonic_envelope(r: &mut ByteReader) -> Result<HarmonicEnvelope, FormatError> {
    let raw: [u8; 8] = r.read_array()?;
    let mut env = HarmonicEnvelope::default();
    for (i, segment) in env.segments.iter_mut().enumerate() {
        *segment = EnvelopeSegment {
            rate: raw[i * 2],
            level: raw[i * 2 + 1],
        };
    }

    // Segments 2 and 3 share their level byte with a loop flag
    env.segments[1].level = raw[3] & LEVEL_MASK;
    env.loop_segment1 = (raw[3] >> LOOP_BIT) & 1 == 1;
    env.segments[2].level = raw[5] & LEVEL_MASK;
    env.loop_segment2 = (raw[5] >> LOOP_BIT) & 1 == 1;

    Ok(env)
}

pub(crate) fn encode_harmonic_envelope(w: &mut ByteWriter, env: &HarmonicEnvelope) {
    let [s1, s2, s3, s4] = env.segments;
    w.write_u8(s1.rate);
    w.write_u8(s1.level);
    w.write_u8(s2.rate);
    w.write_u8((s2.level & LEVEL_MASK) | (env.loop_segment1 as u8) << LOOP_BIT);
    w.write_u8(s3.rate);
    w.write_u8((s3.level & LEVEL_MASK) | (env.loop_segment2 as u8) << LOOP_BIT);
    w.write_u8(s4.rate);
    w.write_u8(s4.level);
}
