// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Fills a `PixelGrid` from a `SampleGrid` under one of three
//! scheduling strategies.
//!
//! The unit of work is a column.  `PixelGrid::columns_mut` splits the
//! output into disjoint slices, and ownership of column x moves to
//! whichever thread computes it for the duration of the pass, so the
//! grid itself is never locked.  Completion is tracked by a
//! `CountDownLatch` that lives only as long as the pass.
//!
//! A panic inside a unit is caught at the column boundary and reported
//! to the latch as `RenderError::Worker`.  The waiter returns that
//! error immediately; units that have not started yet see the latch has
//! failed and skip their work, and the scope joins every thread before
//! control returns to the caller.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use log::{debug, trace, warn};

use crate::complex::Complex;
use crate::error::RenderError;
use crate::grid::PixelGrid;
use crate::latch::{CancelToken, CountDownLatch};
use crate::planes::SampleGrid;

/// How the columns of a pass are scheduled.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// One thread walks x then y.
    Sequential,
    /// Every column gets its own thread, all started at once.
    Unbounded,
    /// A fixed number of workers pull columns from a shared queue.
    Pool(usize),
}

impl Strategy {
    /// A pool sized to the machine.
    pub fn pool() -> Strategy {
        Strategy::Pool(num_cpus::get())
    }

    /// Every strategy, the pool sized to the machine.
    pub fn all() -> Vec<Strategy> {
        vec![Strategy::Sequential, Strategy::Unbounded, Strategy::pool()]
    }

    /// The letter that tags output images produced by this strategy.
    pub fn prefix(self) -> char {
        match self {
            Strategy::Sequential => 'S',
            Strategy::Unbounded => 'P',
            Strategy::Pool(_) => 'E',
        }
    }

    /// The name accepted by `from_str`.
    pub fn name(self) -> &'static str {
        match self {
            Strategy::Sequential => "sequential",
            Strategy::Unbounded => "parallel",
            Strategy::Pool(_) => "pool",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Strategy::Pool(threads) => write!(f, "pool({})", threads),
            other => f.write_str(other.name()),
        }
    }
}

/// Parses `sequential`, `parallel` or `pool`.  A parsed pool is sized
/// to the machine.
impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sequential" | "s" => Ok(Strategy::Sequential),
            "parallel" | "p" => Ok(Strategy::Unbounded),
            "pool" | "e" => Ok(Strategy::pool()),
            _ => Err(format!("unknown strategy '{}'", s)),
        }
    }
}

/// Runs one pass: `grid[x][y] = eval(samples[x][y])` for every pixel.
///
/// `eval` must be pure; it is called concurrently for distinct points.
/// On success every cell of `grid` has been written exactly once.  On
/// failure the grid contents are unspecified.
pub fn execute<F>(
    strategy: Strategy,
    samples: &SampleGrid,
    grid: &mut PixelGrid,
    cancel: &CancelToken,
    eval: F,
) -> Result<(), RenderError>
where
    F: Fn(Complex) -> u32 + Sync,
{
    if grid.width() != samples.width() || grid.height() != samples.height() {
        return Err(RenderError::GridMismatch {
            grid_width: grid.width(),
            grid_height: grid.height(),
            sample_width: samples.width(),
            sample_height: samples.height(),
        });
    }

    debug!(
        "{} pass over {}x{} pixels",
        strategy,
        samples.width(),
        samples.height()
    );
    let result = match strategy {
        Strategy::Sequential => sequential(samples, grid, cancel, &eval),
        Strategy::Unbounded => unbounded(samples, grid, cancel, &eval),
        Strategy::Pool(0) => Err(RenderError::NoThreads),
        Strategy::Pool(threads) => pool(threads, samples, grid, cancel, &eval),
    };
    match &result {
        Ok(()) => debug!("{} pass complete", strategy),
        Err(e) => warn!("{} pass failed: {}", strategy, e),
    }
    result
}

fn sequential<F>(
    samples: &SampleGrid,
    grid: &mut PixelGrid,
    cancel: &CancelToken,
    eval: &F,
) -> Result<(), RenderError>
where
    F: Fn(Complex) -> u32,
{
    let height = samples.height();
    for (x, column) in grid.columns_mut().enumerate() {
        if cancel.is_cancelled() {
            return Err(RenderError::Interrupted {
                remaining: samples.width() - x,
            });
        }
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            for y in 0..height {
                column[y] = eval(samples.get(x, y));
            }
        }));
        if let Err(payload) = outcome {
            return Err(RenderError::Worker {
                column: x,
                message: panic_message(&*payload),
            });
        }
    }
    Ok(())
}

fn unbounded<F>(
    samples: &SampleGrid,
    grid: &mut PixelGrid,
    cancel: &CancelToken,
    eval: &F,
) -> Result<(), RenderError>
where
    F: Fn(Complex) -> u32 + Sync,
{
    let latch = CountDownLatch::new(samples.width());
    let latch = &latch;
    let columns = grid.columns_mut();
    let scoped = crossbeam::scope(|spawner| {
        for (x, column) in columns.enumerate() {
            let name = format!("column-{}", x);
            let spawned = spawner
                .builder()
                .name(name.clone())
                .spawn(move |_| run_column(x, column, samples, eval, latch, cancel));
            if let Err(error) = spawned {
                latch.fail(RenderError::Spawn { name, error });
                break;
            }
        }
        latch.wait(cancel)
    });
    scoped.unwrap_or_else(|payload| Err(scope_panic(&*payload)))
}

fn pool<F>(
    threads: usize,
    samples: &SampleGrid,
    grid: &mut PixelGrid,
    cancel: &CancelToken,
    eval: &F,
) -> Result<(), RenderError>
where
    F: Fn(Complex) -> u32 + Sync,
{
    let latch = CountDownLatch::new(samples.width());
    let latch = &latch;
    let columns = Mutex::new(grid.columns_mut().enumerate());
    let columns = &columns;
    let scoped = crossbeam::scope(|spawner| {
        for worker in 0..threads {
            let name = format!("pool-{}", worker);
            let spawned = spawner.builder().name(name.clone()).spawn(move |_| loop {
                let column = { lock(columns).next() };
                match column {
                    Some((x, column)) => run_column(x, column, samples, eval, latch, cancel),
                    None => break,
                }
            });
            if let Err(error) = spawned {
                latch.fail(RenderError::Spawn { name, error });
                break;
            }
        }
        latch.wait(cancel)
    });
    scoped.unwrap_or_else(|payload| Err(scope_panic(&*payload)))
}

// One unit of work.  Signals the latch exactly once, whether it ran,
// was skipped, or panicked.
fn run_column<F>(
    x: usize,
    column: &mut [u32],
    samples: &SampleGrid,
    eval: &F,
    latch: &CountDownLatch,
    cancel: &CancelToken,
) where
    F: Fn(Complex) -> u32,
{
    if latch.is_failed() || cancel.is_cancelled() {
        trace!("skipping column {}", x);
        latch.skip();
        return;
    }
    let points = samples.column(x);
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        for (cell, &c) in column.iter_mut().zip(points) {
            *cell = eval(c);
        }
    }));
    match outcome {
        Ok(()) => {
            trace!("column {} done", x);
            latch.count_down();
        }
        Err(payload) => latch.fail(RenderError::Worker {
            column: x,
            message: panic_message(&*payload),
        }),
    }
}

// The column queue is never held across a panic, so poisoning can only
// come from outside; carry on regardless.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn scope_panic(payload: &(dyn Any + Send)) -> RenderError {
    RenderError::Worker {
        column: usize::max_value(),
        message: format!("scoped thread panicked: {}", panic_message(payload)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escape::escape_time;
    use crate::planes::{PlaneMapper, PlaneWindow};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    fn samples(width: usize, height: usize) -> SampleGrid {
        PlaneMapper::new(width, height, PlaneWindow::DEFAULT)
            .unwrap()
            .sample()
    }

    fn run(strategy: Strategy, samples: &SampleGrid, depth: u32) -> PixelGrid {
        let mut grid = PixelGrid::new(samples.width(), samples.height());
        execute(strategy, samples, &mut grid, &CancelToken::new(), |c| {
            escape_time(c, depth)
        })
        .unwrap();
        grid
    }

    #[test]
    fn four_by_four_scenario() {
        let window = PlaneWindow::new(-1.0, 1.0, -1.0, 1.0).unwrap();
        let samples = PlaneMapper::new(4, 4, window).unwrap().sample();
        let expected: Vec<u32> = vec![
            2, 4, 10, 4, //
            3, 10, 10, 10, //
            10, 10, 10, 10, //
            1, 4, 4, 4,
        ];
        for strategy in vec![
            Strategy::Sequential,
            Strategy::Unbounded,
            Strategy::Pool(1),
            Strategy::Pool(3),
        ] {
            let grid = run(strategy, &samples, 10);
            assert_eq!(grid.cells(), &expected[..], "{}", strategy);
        }
    }

    #[test]
    fn strategies_agree() {
        let samples = samples(64, 48);
        let reference = run(Strategy::Sequential, &samples, 50);
        assert_eq!(run(Strategy::Unbounded, &samples, 50), reference);
        for threads in 1..6 {
            assert_eq!(run(Strategy::Pool(threads), &samples, 50), reference);
        }
    }

    #[test]
    fn pool_writes_every_cell() {
        let samples = samples(33, 17);
        let mut grid = PixelGrid::filled(33, 17, u32::max_value());
        execute(
            Strategy::Pool(4),
            &samples,
            &mut grid,
            &CancelToken::new(),
            |c| escape_time(c, 20),
        )
        .unwrap();
        assert!(grid.cells().iter().all(|&c| c <= 20));
    }

    #[test]
    fn more_workers_than_columns() {
        let samples = samples(3, 5);
        assert_eq!(
            run(Strategy::Pool(16), &samples, 30),
            run(Strategy::Sequential, &samples, 30)
        );
    }

    #[test]
    fn rejects_mismatched_grids() {
        let samples = samples(4, 4);
        let mut grid = PixelGrid::new(4, 5);
        match execute(
            Strategy::Sequential,
            &samples,
            &mut grid,
            &CancelToken::new(),
            |_| 0,
        ) {
            Err(RenderError::GridMismatch { .. }) => {}
            other => panic!("expected GridMismatch, got {:?}", other),
        }
    }

    #[test]
    fn rejects_empty_pool() {
        let samples = samples(4, 4);
        let mut grid = PixelGrid::new(4, 4);
        match execute(Strategy::Pool(0), &samples, &mut grid, &CancelToken::new(), |_| 0) {
            Err(RenderError::NoThreads) => {}
            other => panic!("expected NoThreads, got {:?}", other),
        }
    }

    #[test]
    fn worker_panic_is_reported_not_hung() {
        let samples = samples(16, 8);
        let poison = samples.get(5, 3);
        for strategy in vec![Strategy::Sequential, Strategy::Unbounded, Strategy::Pool(3)] {
            let mut grid = PixelGrid::new(16, 8);
            let result = execute(strategy, &samples, &mut grid, &CancelToken::new(), |c| {
                if c == poison {
                    panic!("bad point");
                }
                escape_time(c, 10)
            });
            match result {
                Err(RenderError::Worker { column: 5, message }) => {
                    assert_eq!(message, "bad point")
                }
                other => panic!("{}: expected Worker failure, got {:?}", strategy, other),
            }
        }
    }

    #[test]
    fn cancelled_before_start_is_interrupted() {
        let samples = samples(8, 8);
        let cancel = CancelToken::new();
        cancel.cancel();
        for strategy in vec![Strategy::Sequential, Strategy::Unbounded, Strategy::Pool(2)] {
            let mut grid = PixelGrid::new(8, 8);
            match execute(strategy, &samples, &mut grid, &cancel, |c| escape_time(c, 10)) {
                Err(RenderError::Interrupted { .. }) => {}
                other => panic!("{}: expected Interrupted, got {:?}", strategy, other),
            }
        }
    }

    #[test]
    fn cancel_during_pass_unblocks_caller() {
        let samples = samples(64, 4);
        let cancel = CancelToken::new();
        let remote = cancel.clone();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            remote.cancel();
        });
        let mut grid = PixelGrid::new(64, 4);
        let result = execute(Strategy::Pool(1), &samples, &mut grid, &cancel, |c| {
            thread::sleep(Duration::from_millis(2));
            escape_time(c, 10)
        });
        canceller.join().unwrap();
        match result {
            Err(RenderError::Interrupted { remaining }) => assert!(remaining > 0),
            other => panic!("expected Interrupted, got {:?}", other),
        }
    }

    #[test]
    fn cancel_after_the_last_point_still_completes() {
        let samples = samples(2, 2);
        let reference = run(Strategy::Sequential, &samples, 10);
        for strategy in vec![
            Strategy::Sequential,
            Strategy::Unbounded,
            Strategy::Pool(1),
            Strategy::Pool(2),
        ] {
            let cancel = CancelToken::new();
            let remote = cancel.clone();
            let evaluated = AtomicUsize::new(0);
            let mut grid = PixelGrid::filled(2, 2, u32::max_value());
            let result = execute(strategy, &samples, &mut grid, &cancel, |c| {
                let t = escape_time(c, 10);
                if evaluated.fetch_add(1, Ordering::SeqCst) + 1 == 4 {
                    remote.cancel();
                }
                t
            });
            if let Err(e) = result {
                panic!("{}: expected a complete pass, got {:?}", strategy, e);
            }
            assert_eq!(grid, reference, "{}", strategy);
        }
    }

    #[test]
    fn strategy_names_round_trip() {
        assert_eq!("sequential".parse::<Strategy>(), Ok(Strategy::Sequential));
        assert_eq!("parallel".parse::<Strategy>(), Ok(Strategy::Unbounded));
        assert_eq!("pool".parse::<Strategy>(), Ok(Strategy::pool()));
        assert!("fastest".parse::<Strategy>().is_err());
        assert_eq!(Strategy::Sequential.prefix(), 'S');
        assert_eq!(Strategy::Unbounded.prefix(), 'P');
        assert_eq!(Strategy::Pool(2).prefix(), 'E');
    }
}
