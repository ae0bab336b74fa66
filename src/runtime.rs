/*
 * Filename: /src/runtime.rs
 * Project: cheevo-core
 * Created Date: Monday, July 27th 2026, 12:00:00 pm
 * Author: valerino <xoanino@gmail.com>
 * Copyright (c) 2021 valerino
 *
 * MIT License
 *
 * Copyright (c) 2021 valerino
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy of
 * this software and associated documentation files (the "Software"), to deal in
 * the Software without restriction, including without limitation the rights to
 * use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies
 * of the Software, and to permit persons to whom the Software is furnished to do
 * so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */

//! The runtime façade: owns every active achievement trigger, leaderboard
//! and the (at most one) active rich presence script, drives them all
//! through one frame, and persists/restores their progress.

use std::cell::{Cell, RefCell};

use byteorder::{ByteOrder, LittleEndian};

use crate::leaderboard::{LboardEvent, Leaderboard};
use crate::memref::{MemRefPool, Peek};
use crate::parser::error::ParseResult;
use crate::parser::expression::parse_trigger_str;
use crate::parser::leaderboard::parse_leaderboard_str;
use crate::parser::richpresence::parse_richpresence_str;
use crate::richpresence::RichPresence;
use crate::trigger::{Trigger, TriggerEvent};

/// Severity filter for the façade's explicit [`LogCallback`], independent of
/// the ambient `log` crate tracing emitted alongside every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevelFilter {
    None,
    Error,
    Warn,
    Info,
    Verbose,
}

pub type LogCallback = Box<dyn FnMut(LogLevelFilter, &str)>;

/// Host-controlled knobs the reference implementation keeps as process
/// globals; here they are explicit fields on the façade instance instead
/// (see the "Global host override" design note).
pub struct RuntimeConfig {
    pub hostname_override: Option<String>,
    pub hardcore: bool,
    pub log_level: LogLevelFilter,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            hostname_override: None,
            hardcore: false,
            log_level: LogLevelFilter::Warn,
        }
    }
}

/// An event delivered to the host from a single `do_frame` call.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeEvent {
    Achievement(u32, TriggerEvent),
    Leaderboard(u32, LboardEvent),
}

struct ActiveAchievement {
    source: String,
    source_md5: [u8; 16],
    trigger: Trigger,
}

struct ActiveLboard {
    source: String,
    source_md5: [u8; 16],
    lboard: Leaderboard,
}

/// Re-rendered every `RICHPRESENCE_THROTTLE_FRAMES` frames; the cached
/// string is returned in between so a slow macro doesn't cost every frame.
const RICHPRESENCE_THROTTLE_FRAMES: u32 = 60;

struct ActiveRichPresence {
    source: String,
    source_md5: [u8; 16],
    rp: RichPresence,
    cached: RefCell<String>,
    frame_counter: Cell<u32>,
    rendered_once: Cell<bool>,
}

fn source_md5(source: &str) -> [u8; 16] {
    use md5::Digest;
    let digest = md5::Md5::digest(source.as_bytes());
    let mut out = [0u8; 16];
    out.copy_from_slice(&digest);
    out
}

/// Owns every currently-active trigger/leaderboard/richpresence and the
/// memref registry they share.
pub struct Runtime {
    pub config: RuntimeConfig,
    pool: MemRefPool,
    achievements: Vec<(u32, ActiveAchievement)>,
    lboards: Vec<(u32, ActiveLboard)>,
    richpresence: Option<ActiveRichPresence>,
    log_callback: Option<LogCallback>,
}

impl Runtime {
    pub fn new(config: RuntimeConfig) -> Self {
        Runtime {
            config,
            pool: MemRefPool::new(),
            achievements: Vec::new(),
            lboards: Vec::new(),
            richpresence: None,
            log_callback: None,
        }
    }

    pub fn set_log_callback(&mut self, cb: LogCallback) {
        self.log_callback = Some(cb);
    }

    fn notify(&mut self, level: LogLevelFilter, msg: &str) {
        match level {
            LogLevelFilter::Error => log::error!("{}", msg),
            LogLevelFilter::Warn => log::warn!("{}", msg),
            LogLevelFilter::Info => log::info!("{}", msg),
            LogLevelFilter::Verbose => log::debug!("{}", msg),
            LogLevelFilter::None => {}
        }
        if level <= self.config.log_level {
            if let Some(cb) = &mut self.log_callback {
                cb(level, msg);
            }
        }
    }

    /// Parses and activates an achievement's trigger definition under `id`.
    /// Reactivates in place (preserving hit counters) if `source` is
    /// byte-identical to what's already active.
    pub fn activate_achievement(&mut self, id: u32, source: &str) -> ParseResult<()> {
        let md5 = source_md5(source);
        if let Some(pos) = self.achievements.iter().position(|(i, _)| *i == id) {
            if self.achievements[pos].1.source_md5 == md5 {
                self.achievements[pos].1.trigger.enable();
                self.notify(LogLevelFilter::Verbose, &format!("achievement {} reactivated", id));
                return Ok(());
            }
        }

        let trigger = match parse_trigger_str(source, &mut self.pool) {
            Ok(t) => t,
            Err(e) => {
                self.notify(
                    LogLevelFilter::Warn,
                    &format!("achievement {} failed to parse: {}", id, e),
                );
                return Err(e);
            }
        };

        let active = ActiveAchievement {
            source: source.to_string(),
            source_md5: md5,
            trigger,
        };
        if let Some(pos) = self.achievements.iter().position(|(i, _)| *i == id) {
            self.achievements[pos] = (id, active);
        } else {
            self.achievements.push((id, active));
        }
        self.notify(LogLevelFilter::Verbose, &format!("achievement {} activated", id));
        Ok(())
    }

    pub fn deactivate_achievement(&mut self, id: u32) {
        if let Some(pos) = self.achievements.iter().position(|(i, _)| *i == id) {
            self.achievements.remove(pos);
            self.notify(LogLevelFilter::Verbose, &format!("achievement {} deactivated", id));
        }
    }

    pub fn activate_lboard(&mut self, id: u32, source: &str) -> ParseResult<()> {
        let md5 = source_md5(source);
        if let Some(pos) = self.lboards.iter().position(|(i, _)| *i == id) {
            if self.lboards[pos].1.source_md5 == md5 {
                self.lboards[pos].1.lboard.enable();
                self.notify(LogLevelFilter::Verbose, &format!("leaderboard {} reactivated", id));
                return Ok(());
            }
        }

        let lboard = match parse_leaderboard_str(source, &mut self.pool) {
            Ok(l) => l,
            Err(e) => {
                self.notify(
                    LogLevelFilter::Warn,
                    &format!("leaderboard {} failed to parse: {}", id, e),
                );
                return Err(e);
            }
        };

        let active = ActiveLboard {
            source: source.to_string(),
            source_md5: md5,
            lboard,
        };
        if let Some(pos) = self.lboards.iter().position(|(i, _)| *i == id) {
            self.lboards[pos] = (id, active);
        } else {
            self.lboards.push((id, active));
        }
        self.notify(LogLevelFilter::Verbose, &format!("leaderboard {} activated", id));
        Ok(())
    }

    pub fn deactivate_lboard(&mut self, id: u32) {
        if let Some(pos) = self.lboards.iter().position(|(i, _)| *i == id) {
            self.lboards.remove(pos);
            self.notify(LogLevelFilter::Verbose, &format!("leaderboard {} deactivated", id));
        }
    }

    pub fn activate_richpresence(&mut self, source: &str) -> ParseResult<()> {
        let md5 = source_md5(source);
        let rp = match parse_richpresence_str(source, &mut self.pool) {
            Ok(rp) => rp,
            Err(e) => {
                self.notify(LogLevelFilter::Warn, &format!("richpresence failed to parse: {}", e));
                return Err(e);
            }
        };
        self.richpresence = Some(ActiveRichPresence {
            source: source.to_string(),
            source_md5: md5,
            rp,
            cached: RefCell::new(String::new()),
            frame_counter: Cell::new(0),
            rendered_once: Cell::new(false),
        });
        self.notify(LogLevelFilter::Verbose, "richpresence activated");
        Ok(())
    }

    pub fn deactivate_richpresence(&mut self) {
        self.richpresence = None;
    }

    /// The last rendered rich presence string, or an empty string if none
    /// is active or none has rendered yet.
    pub fn richpresence_display(&self) -> String {
        match &self.richpresence {
            Some(a) => a.cached.borrow().clone(),
            None => String::new(),
        }
    }

    /// Refreshes every interned memref, then evaluates every active
    /// achievement, leaderboard and (throttled) the rich presence script,
    /// invoking `emit` for every event produced, in the order guaranteed by
    /// §5: memref refresh, then triggers, then leaderboards, then
    /// richpresence.
    pub fn do_frame<P: Peek + ?Sized>(&mut self, peek: &mut P, mut emit: impl FnMut(RuntimeEvent)) {
        self.pool.refresh(peek);

        for (id, active) in &self.achievements {
            if let Some(event) = active.trigger.evaluate(peek) {
                emit(RuntimeEvent::Achievement(*id, event));
            }
        }

        for (id, active) in &self.lboards {
            if let Some(event) = active.lboard.evaluate(peek) {
                emit(RuntimeEvent::Leaderboard(*id, event));
            }
        }

        if let Some(active) = &self.richpresence {
            let due = !active.rendered_once.get() || active.frame_counter.get() >= RICHPRESENCE_THROTTLE_FRAMES;
            if due {
                *active.cached.borrow_mut() = active.rp.evaluate(peek);
                active.frame_counter.set(0);
                active.rendered_once.set(true);
            } else {
                active.frame_counter.set(active.frame_counter.get() + 1);
            }
        }
    }

    /// Serialises every hit counter, memref delta field, trigger/leaderboard
    /// state and the richpresence throttle counter into a sequence of
    /// length-prefixed, md5-keyed chunks.
    pub fn serialize_progress(&self) -> Vec<u8> {
        let mut out = Vec::new();

        write_chunk(&mut out, ChunkKind::MemRef, &[0u8; 16], |buf| {
            write_u32(buf, self.pool.len() as u32);
            self.pool.for_each(|r| {
                write_u32(buf, r.address);
                buf.push(r.width);
                write_u32(buf, r.value);
                write_u32(buf, r.previous);
                write_u32(buf, r.prior);
                buf.push(r.changed as u8);
            });
        });

        for (id, active) in &self.achievements {
            write_chunk(&mut out, ChunkKind::Trigger, &active.source_md5, |buf| {
                write_u32(buf, *id);
                serialize_condset_hits(&active.trigger.required, buf);
                write_u32(buf, active.trigger.alternates.len() as u32);
                for alt in &active.trigger.alternates {
                    serialize_condset_hits(alt, buf);
                }
                write_u32(buf, active.trigger.measured_value.get());
                write_u32(buf, active.trigger.measured_target.get());
            });
        }

        for (id, active) in &self.lboards {
            write_chunk(&mut out, ChunkKind::Leaderboard, &active.source_md5, |buf| {
                write_u32(buf, *id);
                serialize_condset_hits(&active.lboard.start.required, buf);
                serialize_condset_hits(&active.lboard.cancel.required, buf);
                serialize_condset_hits(&active.lboard.submit.required, buf);
            });
        }

        if let Some(active) = &self.richpresence {
            write_chunk(&mut out, ChunkKind::RichPresence, &active.source_md5, |buf| {
                write_u32(buf, active.frame_counter.get());
                buf.push(active.rendered_once.get() as u8);
            });
        }

        out
    }

    /// Restores state from `bytes`, skipping (and logging) any chunk whose
    /// source md5 no longer matches the currently-active item with that id,
    /// or whose chunk kind is unrecognised.
    pub fn deserialize_progress(&mut self, bytes: &[u8]) {
        let mut pos = 0usize;
        while pos + 21 <= bytes.len() {
            let kind = bytes[pos];
            let md5: [u8; 16] = {
                let mut m = [0u8; 16];
                m.copy_from_slice(&bytes[pos + 1..pos + 17]);
                m
            };
            let len = LittleEndian::read_u32(&bytes[pos + 17..pos + 21]) as usize;
            pos += 21;
            if pos + len > bytes.len() {
                break;
            }
            let payload = &bytes[pos..pos + len];
            pos += len;

            match kind {
                k if k == ChunkKind::MemRef as u8 => self.restore_memref_chunk(payload),
                k if k == ChunkKind::Trigger as u8 => self.restore_trigger_chunk(&md5, payload),
                k if k == ChunkKind::Leaderboard as u8 => self.restore_lboard_chunk(&md5, payload),
                k if k == ChunkKind::RichPresence as u8 => self.restore_richpresence_chunk(&md5, payload),
                _ => {
                    self.notify(LogLevelFilter::Warn, "skipped unknown progress chunk kind");
                }
            }
        }
    }

    fn restore_memref_chunk(&mut self, payload: &[u8]) {
        let mut pos = 0;
        if pos + 4 > payload.len() {
            return;
        }
        let count = LittleEndian::read_u32(&payload[pos..pos + 4]) as usize;
        pos += 4;
        let mut i = 0;
        while i < count && pos + 14 <= payload.len() {
            let address = LittleEndian::read_u32(&payload[pos..pos + 4]);
            let width = payload[pos + 4];
            let value = LittleEndian::read_u32(&payload[pos + 5..pos + 9]);
            let previous = LittleEndian::read_u32(&payload[pos + 9..pos + 13]);
            pos += 13;
            if pos + 5 > payload.len() {
                break;
            }
            let prior = LittleEndian::read_u32(&payload[pos..pos + 4]);
            let changed = payload[pos + 4] != 0;
            pos += 5;
            self.pool.restore(address, width, value, previous, prior, changed);
            i += 1;
        }
    }

    fn restore_trigger_chunk(&mut self, md5: &[u8; 16], payload: &[u8]) {
        if payload.len() < 4 {
            return;
        }
        let id = LittleEndian::read_u32(&payload[0..4]);
        let pos_idx = match self.achievements.iter().position(|(i, _)| *i == id) {
            Some(p) => p,
            None => return,
        };
        if &self.achievements[pos_idx].1.source_md5 != md5 {
            self.notify(
                LogLevelFilter::Warn,
                &format!("rejected stale trigger progress for achievement {}", id),
            );
            return;
        }
        let mut pos = 4;
        let trigger = &self.achievements[pos_idx].1.trigger;
        if !restore_condset_hits(&trigger.required, payload, &mut pos) {
            return;
        }
        if pos + 4 > payload.len() {
            return;
        }
        let alt_count = LittleEndian::read_u32(&payload[pos..pos + 4]) as usize;
        pos += 4;
        for i in 0..alt_count.min(trigger.alternates.len()) {
            if !restore_condset_hits(&trigger.alternates[i], payload, &mut pos) {
                return;
            }
        }
        if pos + 8 <= payload.len() {
            trigger.measured_value.set(LittleEndian::read_u32(&payload[pos..pos + 4]));
            trigger.measured_target.set(LittleEndian::read_u32(&payload[pos + 4..pos + 8]));
        }
    }

    fn restore_lboard_chunk(&mut self, md5: &[u8; 16], payload: &[u8]) {
        if payload.len() < 4 {
            return;
        }
        let id = LittleEndian::read_u32(&payload[0..4]);
        let pos_idx = match self.lboards.iter().position(|(i, _)| *i == id) {
            Some(p) => p,
            None => return,
        };
        if &self.lboards[pos_idx].1.source_md5 != md5 {
            self.notify(
                LogLevelFilter::Warn,
                &format!("rejected stale leaderboard progress for leaderboard {}", id),
            );
            return;
        }
        let mut pos = 4;
        let lboard = &self.lboards[pos_idx].1.lboard;
        let _ = restore_condset_hits(&lboard.start.required, payload, &mut pos)
            && restore_condset_hits(&lboard.cancel.required, payload, &mut pos)
            && restore_condset_hits(&lboard.submit.required, payload, &mut pos);
    }

    fn restore_richpresence_chunk(&mut self, md5: &[u8; 16], payload: &[u8]) {
        let active = match &self.richpresence {
            Some(a) if &a.source_md5 == md5 => a,
            _ => {
                self.notify(LogLevelFilter::Warn, "rejected stale richpresence progress");
                return;
            }
        };
        if payload.len() >= 5 {
            active.frame_counter.set(LittleEndian::read_u32(&payload[0..4]));
            active.rendered_once.set(payload[4] != 0);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkKind {
    MemRef = 0,
    Trigger = 1,
    Leaderboard = 2,
    RichPresence = 3,
}

fn write_u32(buf: &mut Vec<u8>, v: u32) {
    let mut b = [0u8; 4];
    LittleEndian::write_u32(&mut b, v);
    buf.extend_from_slice(&b);
}

fn write_chunk(out: &mut Vec<u8>, kind: ChunkKind, md5: &[u8; 16], body: impl FnOnce(&mut Vec<u8>)) {
    let mut payload = Vec::new();
    body(&mut payload);
    out.push(kind as u8);
    out.extend_from_slice(md5);
    write_u32(out, payload.len() as u32);
    out.extend_from_slice(&payload);
}

fn serialize_condset_hits(set: &crate::condset::CondSet, buf: &mut Vec<u8>) {
    write_u32(buf, set.conditions.len() as u32);
    for c in &set.conditions {
        write_u32(buf, c.current_hits.get());
    }
}

/// Restores hit counters into `set` from `bytes` at `pos`, advancing `pos`.
/// Returns `false` (without touching `set`'s remaining counters) if the
/// serialized condition count no longer matches, which happens only if the
/// source changed without its md5 changing (not expected, but tolerated).
fn restore_condset_hits(set: &crate::condset::CondSet, bytes: &[u8], pos: &mut usize) -> bool {
    if *pos + 4 > bytes.len() {
        return false;
    }
    let count = LittleEndian::read_u32(&bytes[*pos..*pos + 4]) as usize;
    *pos += 4;
    if count != set.conditions.len() {
        return false;
    }
    for c in &set.conditions {
        if *pos + 4 > bytes.len() {
            return false;
        }
        c.current_hits.set(LittleEndian::read_u32(&bytes[*pos..*pos + 4]));
        *pos += 4;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ram_peek(ram: std::rc::Rc<std::cell::RefCell<[u8; 5]>>) -> impl FnMut(u32, u8) -> u32 {
        move |addr: u32, n: u8| {
            let r = ram.borrow();
            let mut v = 0u32;
            for i in 0..n {
                v |= (r[(addr + i as u32) as usize] as u32) << (8 * i);
            }
            v
        }
    }

    #[test]
    fn activates_and_fires_an_achievement() {
        let mut rt = Runtime::new(RuntimeConfig::default());
        rt.activate_achievement(1, "0xH0001=18").unwrap();

        let ram = std::rc::Rc::new(std::cell::RefCell::new([0u8, 0, 0, 0, 0]));
        let mut peek = ram_peek(ram.clone());

        let mut events = Vec::new();
        rt.do_frame(&mut peek, |e| events.push(e));
        assert_eq!(events, vec![RuntimeEvent::Achievement(1, TriggerEvent::Activated)]);

        ram.borrow_mut()[1] = 18;
        events.clear();
        rt.do_frame(&mut peek, |e| events.push(e));
        assert_eq!(events, vec![RuntimeEvent::Achievement(1, TriggerEvent::Triggered)]);
    }

    #[test]
    fn rejects_malformed_source_and_keeps_the_previous_item_inactive() {
        let mut rt = Runtime::new(RuntimeConfig::default());
        let err = rt.activate_achievement(1, "not a trigger").unwrap_err();
        assert_eq!(err.t, crate::parser::error::ParseErrorType::InvalidMemoryOperand);
    }

    #[test]
    fn leaderboard_round_trip_through_the_facade() {
        let mut rt = Runtime::new(RuntimeConfig::default());
        rt.activate_lboard(7, "STA:0xH00=1::CAN:0xH00=2::SUB:0xH00=3::VAL:0xH02")
            .unwrap();

        let ram = std::rc::Rc::new(std::cell::RefCell::new([0u8, 0, 0x34, 0, 0]));
        let mut peek = ram_peek(ram.clone());

        let mut events = Vec::new();
        rt.do_frame(&mut peek, |e| events.push(e));
        assert!(events.is_empty());

        ram.borrow_mut()[0] = 1;
        events.clear();
        rt.do_frame(&mut peek, |e| events.push(e));
        assert_eq!(events.len(), 1);
        matches!(events[0], RuntimeEvent::Leaderboard(7, LboardEvent::Started(_)));
    }

    #[test]
    fn richpresence_renders_eagerly_on_the_first_frame() {
        let mut rt = Runtime::new(RuntimeConfig::default());
        rt.activate_richpresence("Display:\nHello").unwrap();
        assert_eq!(rt.richpresence_display(), "");

        let mut peek = |_: u32, _: u8| 0u32;
        rt.do_frame(&mut peek, |_| {});
        assert_eq!(rt.richpresence_display(), "Hello");
    }

    #[test]
    fn serialize_then_deserialize_restores_hit_counts() {
        let mut rt = Runtime::new(RuntimeConfig::default());
        rt.activate_achievement(1, "0xH0001=18(3)").unwrap();

        let ram = std::rc::Rc::new(std::cell::RefCell::new([0u8, 18, 0, 0, 0]));
        let mut peek = ram_peek(ram);
        rt.do_frame(&mut peek, |_| {});
        rt.do_frame(&mut peek, |_| {});

        let saved = rt.serialize_progress();

        let mut rt2 = Runtime::new(RuntimeConfig::default());
        rt2.activate_achievement(1, "0xH0001=18(3)").unwrap();
        rt2.deserialize_progress(&saved);

        assert_eq!(
            rt2.achievements[0].1.trigger.required.conditions[0].current_hits.get(),
            rt.achievements[0].1.trigger.required.conditions[0].current_hits.get()
        );
    }
}
