/*
 * This file is part of avltree, a concurrent ordered set library.
 *
 * Copyright (c) 2026, avltree authors.
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 *
*/

//! The k-word compare-and-swap primitive (C5's foundation): a software
//! descriptor-based KCAS built on RDCSS, plus a hardware-transactional-memory
//! fast path on targets that support RTM.
//!
//! Every word managed by this module reserves its low two bits as a tag:
//! `00` plain value, `01` an RDCSS descriptor pointer, `10` a KCAS descriptor
//! pointer. Integer payloads are shifted left by two to make room; pointer
//! payloads rely on natural alignment (every node is allocated with at least
//! 4-byte alignment) and are stored untouched.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

pub const TAG_MASK: u64 = 0b11;
pub const TAG_NONE: u64 = 0b00;
pub const TAG_RDCSS: u64 = 0b01;
pub const TAG_KCAS: u64 = 0b10;
pub const SHIFT_BITS: u32 = 2;

#[inline]
pub fn tag_of(w: u64) -> u64 {
    w & TAG_MASK
}

#[inline]
pub fn encode_val(v: u64) -> u64 {
    (v << SHIFT_BITS) | TAG_NONE
}

#[inline]
pub fn decode_val(w: u64) -> u64 {
    (w & !TAG_MASK) >> SHIFT_BITS
}

#[inline]
pub fn encode_ptr(p: usize) -> u64 {
    debug_assert_eq!(p & (TAG_MASK as usize), 0, "pointee must be 4-byte aligned");
    p as u64 | TAG_NONE
}

#[inline]
pub fn decode_ptr(w: u64) -> usize {
    (w & !TAG_MASK) as usize
}

/// A single KCAS-managed memory word.
#[derive(Debug)]
#[repr(transparent)]
pub struct CasWord(AtomicU64);

impl CasWord {
    pub fn new(raw: u64) -> Self {
        Self(AtomicU64::new(raw))
    }

    /// Raw load, bypassing descriptor helping. Only safe when the caller
    /// already knows no descriptor can be present (e.g. during
    /// single-threaded teardown).
    pub fn load_raw(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    pub fn store_raw(&self, v: u64) {
        self.0.store(v, Ordering::Release);
    }
}

struct KcasEntry {
    addr: *const CasWord,
    old: u64,
    new: u64,
}

// Safety: entries only ever point at `CasWord`s owned by tree nodes that
// outlive the descriptor (the originating thread holds an epoch guard for
// the duration of the transaction, and descriptors are never freed).
unsafe impl Send for KcasEntry {}
unsafe impl Sync for KcasEntry {}

const UNDECIDED: u8 = 0;
const SUCCEEDED: u8 = 1;
const FAILED: u8 = 2;

#[repr(align(8))]
struct KcasDesc {
    state: AtomicU8,
    entries: Vec<KcasEntry>,
}

#[repr(align(8))]
struct RdcssDesc {
    status_addr: *const AtomicU8,
    status_old: u8,
    target: *const CasWord,
    old: u64,
    new: u64,
}

unsafe impl Send for RdcssDesc {}
unsafe impl Sync for RdcssDesc {}

#[inline]
fn tagged(ptr: *const (), tag: u64) -> u64 {
    ptr as u64 | tag
}

fn rdcss_help(d: &RdcssDesc) {
    let status = unsafe { (*d.status_addr).load(Ordering::Acquire) };
    let cw = unsafe { &*d.target };
    let self_tagged = tagged(d as *const RdcssDesc as *const (), TAG_RDCSS);
    if status == d.status_old {
        let _ = cw.0.compare_exchange(self_tagged, d.new, Ordering::AcqRel, Ordering::Relaxed);
    } else {
        let _ = cw.0.compare_exchange(self_tagged, d.old, Ordering::AcqRel, Ordering::Relaxed);
    }
}

fn rdcss_help_other(tagged_word: u64) {
    let d = unsafe { &*((tagged_word & !TAG_MASK) as *const RdcssDesc) };
    rdcss_help(d);
}

fn rdcss(d: &RdcssDesc) -> u64 {
    let cw = unsafe { &*d.target };
    let self_tagged = tagged(d as *const RdcssDesc as *const (), TAG_RDCSS);
    let r = loop {
        match cw.0.compare_exchange(d.old, self_tagged, Ordering::AcqRel, Ordering::Acquire) {
            Ok(prev) => break prev,
            Err(observed) => {
                if tag_of(observed) == TAG_RDCSS {
                    rdcss_help_other(observed);
                    continue;
                }
                return observed;
            }
        }
    };
    if r == d.old {
        rdcss_help(d);
    }
    r
}

fn rdcss_read(target: &CasWord) -> u64 {
    loop {
        let r = target.0.load(Ordering::Acquire);
        if tag_of(r) == TAG_RDCSS {
            rdcss_help_other(r);
            continue;
        }
        return r;
    }
}

fn kcas_help(desc: &KcasDesc) -> bool {
    if desc.state.load(Ordering::Acquire) == UNDECIDED {
        let mut outcome = SUCCEEDED;
        let self_tagged = tagged(desc as *const KcasDesc as *const (), TAG_KCAS);
        'entries: for entry in desc.entries.iter() {
            loop {
                // Leaked permanently, like `KcasDesc` below: a concurrent
                // thread can observe the tagged pointer to this descriptor
                // and dereference it after this call returns, so it must
                // outlive the stack frame that creates it.
                let rd = Box::leak(Box::new(RdcssDesc {
                    status_addr: &desc.state as *const AtomicU8,
                    status_old: UNDECIDED,
                    target: entry.addr,
                    old: entry.old,
                    new: self_tagged,
                }));
                let val = rdcss(rd);
                if tag_of(val) == TAG_KCAS {
                    if val != self_tagged {
                        kcas_help_other(val);
                        continue;
                    }
                    continue 'entries;
                } else if val != entry.old {
                    outcome = FAILED;
                    break 'entries;
                } else {
                    continue 'entries;
                }
            }
        }
        let _ = desc
            .state
            .compare_exchange(UNDECIDED, outcome, Ordering::AcqRel, Ordering::Relaxed);
    }
    let succeeded = desc.state.load(Ordering::Acquire) == SUCCEEDED;
    let self_tagged = tagged(desc as *const KcasDesc as *const (), TAG_KCAS);
    for entry in desc.entries.iter() {
        let final_val = if succeeded { entry.new } else { entry.old };
        let cw = unsafe { &*entry.addr };
        let _ = cw.0.compare_exchange(self_tagged, final_val, Ordering::AcqRel, Ordering::Relaxed);
    }
    succeeded
}

fn kcas_help_other(tagged_word: u64) -> bool {
    let d = unsafe { &*((tagged_word & !TAG_MASK) as *const KcasDesc) };
    kcas_help(d)
}

/// One entry of a pending multi-word compare-and-swap: `*addr` must equal
/// `old` for the whole transaction to succeed, in which case it becomes
/// `new`.
pub struct Entry {
    pub addr: *const CasWord,
    pub old: u64,
    pub new: u64,
}

const HTM_MAX_RETRIES: u32 = 5;
const HTM_ABORT_BAD_VALUE: u32 = 0xfe;

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "rtm")]
unsafe fn htm_attempt(entries: &[Entry]) -> Option<bool> {
    use core::arch::x86_64::{_xabort, _xbegin, _xend, _XBEGIN_STARTED};
    for _ in 0..HTM_MAX_RETRIES {
        let status = unsafe { _xbegin() };
        if status == _XBEGIN_STARTED {
            for e in entries {
                unsafe {
                    let cw = &*e.addr;
                    if cw.0.load(Ordering::Relaxed) != e.old {
                        _xabort::<HTM_ABORT_BAD_VALUE>();
                    }
                    cw.0.store(e.new, Ordering::Relaxed);
                }
            }
            unsafe { _xend() };
            return Some(true);
        }
        // any abort (conflict, capacity, explicit) just retries the loop;
        // a bounded retry count bounds how long we chase a busy cache line.
    }
    None
}

#[cfg(target_arch = "x86_64")]
fn try_htm(entries: &[Entry]) -> Option<bool> {
    if std::is_x86_feature_detected!("rtm") {
        unsafe { htm_attempt(entries) }
    } else {
        None
    }
}

#[cfg(not(target_arch = "x86_64"))]
fn try_htm(_entries: &[Entry]) -> Option<bool> {
    None
}

/// Executes a k-word compare-and-swap. Entries are sorted by address first
/// (a fixed global order across all transactions is what keeps the
/// descriptor-helping protocol progress-guaranteed). Tries the HTM fast path
/// first; falls back to the RDCSS-backed software descriptor on any abort.
pub fn execute(mut entries: Vec<Entry>) -> bool {
    entries.sort_by_key(|e| e.addr as usize);
    if let Some(result) = try_htm(&entries) {
        return result;
    }
    let kentries: Vec<KcasEntry> = entries
        .into_iter()
        .map(|e| KcasEntry {
            addr: e.addr,
            old: e.old,
            new: e.new,
        })
        .collect();
    // Leaked permanently: this crate never frees KCAS descriptors, mirroring
    // the reusable-descriptor-array design of the source it is modeled on
    // (a fixed pool of per-thread slots that live for the process lifetime)
    // without needing a thread-indexed pool of its own.
    let desc = Box::leak(Box::new(KcasDesc {
        state: AtomicU8::new(UNDECIDED),
        entries: kentries,
    }));
    kcas_help(desc)
}

/// Reads the logical value at `target`, helping along any descriptor it
/// observes until the word settles on a plain value.
pub fn read(target: &CasWord) -> u64 {
    loop {
        let r = rdcss_read(target);
        if tag_of(r) == TAG_KCAS {
            kcas_help_other(r);
            continue;
        }
        return r;
    }
}
