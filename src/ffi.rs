//! C entry points used by the host application.
//!
//! The host links against these symbols directly (for example through
//! `DllImport("__Internal")`) and reads the returned text with an ANSI
//! string marshaller.

#![allow(non_snake_case)]

use crate::config::Config;
use crate::logging;
use crate::sampler::Sampler;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::ffi::c_char;

static SAMPLER: Lazy<Mutex<Sampler>> = Lazy::new(|| {
    logging::init();
    Mutex::new(Sampler::new(&Config::load()))
});

/// Arms the process-wide sampler. Calling it again restarts the timer.
#[no_mangle]
pub extern "C" fn StartTracking() {
    let mut sampler = SAMPLER.lock();
    log::info!("StartTracking called");
    if let Err(err) = sampler.start() {
        log::error!("StartTracking: {err}");
    }
}

/// Disarms the sampler and returns the report text.
///
/// The buffer belongs to the library and stays valid until the next call to
/// `StopTracking`. Null is returned only if no buffer could ever be allocated.
#[no_mangle]
pub extern "C" fn StopTracking() -> *const c_char {
    let mut sampler = SAMPLER.lock();
    log::info!("StopTracking called");
    let report = sampler.stop_and_export();
    if let Some(text) = sampler.exporter().last_text() {
        log::info!("Usage Data: {text}");
    }
    report
}

#[no_mangle]
pub extern "C" fn TrackingActive() -> bool {
    SAMPLER.lock().is_tracking()
}
