// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The bounded-concurrency per-baseline worker scheduler.
//!
//! One OS thread is spawned per baseline, capped at `max_threads`
//! concurrently running. Concurrency is capped with a
//! `crossbeam_channel::bounded` token channel sized to `max_threads`,
//! acquired with a timed `recv` so the dispatcher still polls the
//! cancellation flag at a steady cadence while waiting for a free slot,
//! rather than a shared running-count counter or a node-mutating lock that
//! would race across concurrently running baselines. Each worker instead
//! does a per-call, read-only lookup into its own node's location track, so
//! no worker ever touches state another worker can also write.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use num_complex::Complex64;

use crate::baseline::{Baseline, ReferenceMode};
use crate::correlate;
use crate::error::{Result, VlbiError};
use crate::grid::{DepositMode, UvGrid};
use crate::node_registry::NodeRegistry;

/// A user-supplied replacement for `correlate`, mapping a deposited sample's
/// `(u, v)` \[wavelengths\] to the complex value to write. Used e.g. for
/// UV-coverage mode or to drive the scheduler with a deterministic
/// correlator in tests.
pub type Delegate = Arc<dyn Fn(f64, f64) -> Complex64 + Send + Sync>;

/// Tunables for a single grid-fill run.
#[derive(Clone)]
pub struct SchedulerConfig {
    pub max_threads: usize,
    pub moving_baseline: bool,
    pub nodelay: bool,
    pub mode: DepositMode,
    pub show_progress: bool,
    pub delegate: Option<Delegate>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_threads: 1,
            moving_baseline: false,
            nodelay: false,
            mode: DepositMode::ApertureSynthesis,
            show_progress: false,
            delegate: None,
        }
    }
}

/// Deposit every baseline's correlation into `grid` over `[t_start, t_end)`,
/// bounded to `config.max_threads` concurrent workers. Cancellation is
/// observed once per sample per worker via `cancel`.
#[allow(clippy::too_many_arguments)]
pub fn fill_grid(
    baselines: &[Baseline],
    nodes: &NodeRegistry,
    grid: &Mutex<UvGrid>,
    t_start: f64,
    t_end: f64,
    ra: f64,
    dec: f64,
    reference: ReferenceMode,
    cancel: &AtomicBool,
    config: &SchedulerConfig,
) -> Result<()> {
    let cap = config.max_threads.max(1);
    let (token_tx, token_rx) = bounded::<()>(cap);
    for _ in 0..cap {
        token_tx
            .send(())
            .expect("channel just created with capacity == cap");
    }

    let multi_progress = if config.show_progress {
        Some(MultiProgress::new())
    } else {
        None
    };

    let result = crossbeam_utils::thread::scope(|scope| {
        for baseline in baselines {
            let mut acquired = false;
            loop {
                match token_rx.recv_timeout(Duration::from_micros(100)) {
                    Ok(()) => {
                        acquired = true;
                        break;
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        if cancel.load(Ordering::Relaxed) {
                            break;
                        }
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            if !acquired {
                // Cancelled (or the token channel died) before a slot freed
                // up: stop dispatching further baselines entirely.
                break;
            }
            // One bar per baseline worker, not one shared bar, so
            // concurrently running workers each show their own progress.
            let bar = multi_progress.as_ref().map(|mp| {
                let pb = mp.add(ProgressBar::new(1000));
                if let Ok(style) = ProgressStyle::with_template(
                    "[{elapsed_precise}] {bar:40.cyan/blue} {msg}",
                ) {
                    pb.set_style(style);
                }
                pb.set_message(baseline.name.clone());
                pb
            });
            let token_tx = token_tx.clone();
            scope.spawn(move |_| {
                run_baseline_worker(
                    baseline, nodes, grid, t_start, t_end, ra, dec, reference, cancel, config,
                    bar.as_ref(),
                );
                if let Some(pb) = &bar {
                    pb.finish_and_clear();
                }
                let _ = token_tx.send(());
            });
        }
    });

    result.map_err(|_| VlbiError::Generic("a baseline worker thread panicked".to_string()))
}

#[allow(clippy::too_many_arguments)]
fn run_baseline_worker(
    baseline: &Baseline,
    nodes: &NodeRegistry,
    grid: &Mutex<UvGrid>,
    t_start: f64,
    t_end: f64,
    ra: f64,
    dec: f64,
    reference: ReferenceMode,
    cancel: &AtomicBool,
    config: &SchedulerConfig,
    progress: Option<&ProgressBar>,
) {
    let (Some(node1), Some(node2)) = (nodes.at(baseline.n1_index), nodes.at(baseline.n2_index))
    else {
        log::warn!("baseline '{}': an endpoint node vanished, skipping", baseline.name);
        return;
    };

    let sample_rate = node1.stream.sample_rate.max(node2.stream.sample_rate);
    if sample_rate <= 0.0 {
        return;
    }
    let dt = 1.0 / sample_rate;
    let wavelength = if node1.stream.wavelength > 0.0 {
        node1.stream.wavelength
    } else {
        node2.stream.wavelength
    };

    let (width, height) = {
        let g = grid.lock().expect("grid mutex poisoned");
        (g.width(), g.height())
    };

    let mut previous_idx: Option<usize> = None;
    let mut l: usize = 0;
    let mut t = t_start;
    while t < t_end {
        if cancel.load(Ordering::Relaxed) {
            break;
        }

        let loc1 = if config.moving_baseline {
            node1.stream.location_at_step(l, node1.location).ecef()
        } else {
            node1.location.ecef()
        };
        let loc2 = if config.moving_baseline {
            node2.stream.location_at_step(l, node2.location).ecef()
        } else {
            node2.location.ecef()
        };

        let Some(uvw) = baseline.project(t, ra, dec, loc1, loc2, reference, wavelength) else {
            t += dt;
            l += 1;
            continue;
        };

        let col = uvw.u.round() as isize + width as isize / 2;
        let row = uvw.v.round() as isize + height as isize / 2;
        if col < 0 || row < 0 {
            t += dt;
            l += 1;
            continue;
        }
        let (col, row) = (col as usize, row as usize);
        let idx = row * width.max(1) + col;

        if previous_idx != Some(idx) {
            previous_idx = Some(idx);

            let value = if let Some(locked) = baseline.locked_buffer() {
                locked.get(l).copied().unwrap_or(Complex64::new(0.0, 0.0))
            } else if let Some(delegate) = &config.delegate {
                delegate(uvw.u, uvw.v)
            } else {
                let (offset1, offset2) = if config.nodelay {
                    (0.0, 0.0)
                } else {
                    correlate::delay_referenced_offsets(baseline, nodes, t, ra, dec, reference)
                };
                correlate::correlate(&node1.stream, t + offset1, &node2.stream, t + offset2)
            };

            let mut g = grid.lock().expect("grid mutex poisoned");
            g.deposit(row, col, value, config.mode);

            let frac = (t - t_start) / (t_end - t_start);
            log::trace!("baseline '{}' progress: {:.3}", baseline.name, frac);
            if let Some(pb) = progress {
                pb.set_position((frac.clamp(0.0, 1.0) * 1000.0) as u64);
            }
        }

        t += dt;
        l += 1;
    }
}
