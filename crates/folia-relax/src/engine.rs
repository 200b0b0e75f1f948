//! Shared iteration protocol for smoothing and morphing.
//!
//! The engine double-buffers the coordinate array and runs a kernel
//! over every vertex each iteration, either on the calling thread or
//! on a small pool of long-lived workers. Each worker owns a disjoint,
//! contiguous vertex range assigned once at startup; there is no
//! work-stealing or rebalancing.
//!
//! Per iteration the coordinator:
//! 1. runs the kernel's serial pre-pass (with workers parked),
//! 2. publishes the input/output buffer pointers and the iteration
//!    flags,
//! 3. on the first iteration only, blocks until every worker has
//!    entered its wait loop (releasing work before this barrier races
//!    the first iteration),
//! 4. clears the done counter and releases each worker, marking the
//!    final iteration so workers exit their loop after it,
//! 5. blocks until the done count reaches the worker count,
//! 6. swaps the buffer roles — except after the final iteration, so
//!    the output buffer holds the result.
//!
//! Workers never read another worker's output during an iteration:
//! they read the shared immutable input buffer and write only their
//! own slice of the output buffer, so only the phase state needs a
//! lock.

use std::ops::Range;
use std::sync::{Condvar, Mutex};

use glam::Vec3;

/// Flags recomputed by the coordinator for each iteration.
#[derive(Debug, Clone, Copy, Default)]
pub struct IterationPass {
    /// Edge vertices are eligible this iteration.
    pub relax_edges: bool,
    /// Landmark-neighbor vertices are eligible this iteration.
    pub relax_landmark_neighbors: bool,
}

/// Write handle over the whole output coordinate buffer.
///
/// Several workers hold handles to the same buffer; the protocol
/// guarantees each writes only vertices in its own range, so the
/// raw-pointer writes never overlap.
pub struct OutputCoords {
    ptr: *mut f32,
    len: usize,
}

unsafe impl Send for OutputCoords {}

impl OutputCoords {
    fn new(ptr: *mut f32, len: usize) -> Self {
        Self { ptr, len }
    }

    /// Write the position of vertex `v`.
    #[inline]
    pub fn write(&mut self, v: usize, p: Vec3) {
        debug_assert!(v * 3 + 2 < self.len);
        unsafe {
            *self.ptr.add(v * 3) = p.x;
            *self.ptr.add(v * 3 + 1) = p.y;
            *self.ptr.add(v * 3 + 2) = p.z;
        }
    }

    /// Copy vertex `v` through from the input buffer unchanged.
    #[inline]
    pub fn copy_from_input(&mut self, input: &[f32], v: usize) {
        debug_assert!(v * 3 + 2 < self.len);
        unsafe {
            *self.ptr.add(v * 3) = input[v * 3];
            *self.ptr.add(v * 3 + 1) = input[v * 3 + 1];
            *self.ptr.add(v * 3 + 2) = input[v * 3 + 2];
        }
    }
}

/// A relaxation kernel: the per-vertex update rule.
pub trait RelaxKernel: Sync {
    /// Serial pre-pass run by the coordinator before each iteration,
    /// while all workers are parked. Morphing uses it to refresh the
    /// forces on frozen vertices that movable neighbors read.
    fn begin_iteration(&self, _input: &[f32]) {}

    /// Relax the vertices in `range`, reading any vertex from `input`
    /// and writing only vertices in `range` to `output`.
    fn relax_range(
        &self,
        pass: &IterationPass,
        range: Range<usize>,
        input: &[f32],
        output: &mut OutputCoords,
    );
}

/// Iteration count and cadences for one relaxation run.
#[derive(Debug, Clone, Copy)]
pub struct RelaxSchedule {
    /// Total iterations (≥ 1; forces-only callers pass 1 and discard
    /// the coordinates).
    pub iterations: u32,
    /// Edge-vertex cadence; 0 = never.
    pub edge_every: u32,
    /// Landmark-neighbor cadence; 0 = never. Counted independently of
    /// the edge cadence.
    pub landmark_neighbor_every: u32,
    /// Rescale all output positions to `sphere_radius` every N
    /// iterations; 0 = never.
    pub project_to_sphere_every: u32,
    /// Radius for the periodic sphere projection.
    pub sphere_radius: f32,
    /// Worker threads; values ≤ 1 run on the calling thread.
    pub threads: usize,
}

/// Phase state shared between the coordinator and workers. Every field
/// is read and written only under the mutex.
struct Phase {
    /// Workers that have entered their wait loop.
    started: usize,
    /// Workers finished with the current iteration.
    done: usize,
    /// Per-worker release flag; cleared by the worker as it picks the
    /// iteration up.
    release: Vec<bool>,
    /// Set with the final release; workers exit after the iteration.
    stop: bool,
    /// Published input buffer for the current iteration.
    input_ptr: *const f32,
    /// Published output buffer for the current iteration.
    output_ptr: *mut f32,
    len: usize,
    pass: IterationPass,
}

unsafe impl Send for Phase {}

struct SharedState {
    phase: Mutex<Phase>,
    condvar: Condvar,
}

/// Run `kernel` over `initial` for the scheduled iterations, returning
/// the final coordinate buffer.
pub fn run_relaxation<K: RelaxKernel>(
    kernel: &K,
    initial: &[f32],
    schedule: &RelaxSchedule,
) -> Vec<f32> {
    let vertex_count = initial.len() / 3;
    let mut buffer_a = initial.to_vec();
    let mut buffer_b = initial.to_vec();
    let iterations = schedule.iterations.max(1);

    let threads = schedule.threads.clamp(1, vertex_count.max(1));
    if threads <= 1 {
        run_single_threaded(kernel, &mut buffer_a, &mut buffer_b, iterations, schedule);
    } else {
        run_threaded(
            kernel,
            &mut buffer_a,
            &mut buffer_b,
            iterations,
            schedule,
            threads,
        );
    }

    // Buffers swap roles after every iteration but the last, so the
    // final output lands in A exactly when the iteration count is odd.
    if iterations % 2 == 1 {
        buffer_b
    } else {
        buffer_a
    }
}

/// Per-iteration cadence bookkeeping, identical in both execution
/// modes.
struct Cadence {
    landmark_counter: u32,
}

impl Cadence {
    fn new() -> Self {
        Self { landmark_counter: 1 }
    }

    fn pass_for(&mut self, iteration: u32, schedule: &RelaxSchedule) -> IterationPass {
        let relax_edges = schedule.edge_every > 0 && iteration % schedule.edge_every == 0;

        let relax_landmark_neighbors = if self.landmark_counter
            == schedule.landmark_neighbor_every
        {
            self.landmark_counter = 1;
            true
        } else {
            self.landmark_counter += 1;
            false
        };

        IterationPass {
            relax_edges,
            relax_landmark_neighbors,
        }
    }
}

fn project_outputs_to_sphere(output: &mut [f32], radius: f32) {
    for triple in output.chunks_exact_mut(3) {
        let len = (triple[0] * triple[0] + triple[1] * triple[1] + triple[2] * triple[2]).sqrt();
        if len > 0.0 {
            let scale = radius / len;
            triple[0] *= scale;
            triple[1] *= scale;
            triple[2] *= scale;
        }
    }
}

fn maybe_project(output: &mut [f32], iteration: u32, schedule: &RelaxSchedule) {
    if schedule.project_to_sphere_every > 0 && iteration % schedule.project_to_sphere_every == 0 {
        project_outputs_to_sphere(output, schedule.sphere_radius);
    }
}

fn run_single_threaded<K: RelaxKernel>(
    kernel: &K,
    buffer_a: &mut Vec<f32>,
    buffer_b: &mut Vec<f32>,
    iterations: u32,
    schedule: &RelaxSchedule,
) {
    let vertex_count = buffer_a.len() / 3;
    let mut cadence = Cadence::new();
    let mut a_is_input = true;

    for iteration in 1..=iterations {
        let pass = cadence.pass_for(iteration, schedule);
        let (input, output): (&[f32], &mut Vec<f32>) = if a_is_input {
            (&*buffer_a, &mut *buffer_b)
        } else {
            (&*buffer_b, &mut *buffer_a)
        };

        kernel.begin_iteration(input);
        let mut handle = OutputCoords::new(output.as_mut_ptr(), output.len());
        kernel.relax_range(&pass, 0..vertex_count, input, &mut handle);
        maybe_project(output, iteration, schedule);

        if iteration != iterations {
            a_is_input = !a_is_input;
        }
    }
}

fn run_threaded<K: RelaxKernel>(
    kernel: &K,
    buffer_a: &mut Vec<f32>,
    buffer_b: &mut Vec<f32>,
    iterations: u32,
    schedule: &RelaxSchedule,
    threads: usize,
) {
    let vertex_count = buffer_a.len() / 3;
    let len = buffer_a.len();

    let shared = SharedState {
        phase: Mutex::new(Phase {
            started: 0,
            done: 0,
            release: vec![false; threads],
            stop: false,
            input_ptr: std::ptr::null(),
            output_ptr: std::ptr::null_mut(),
            len,
            pass: IterationPass::default(),
        }),
        condvar: Condvar::new(),
    };

    // Contiguous ranges; the last worker absorbs the remainder.
    let per_thread = vertex_count / threads;
    let ranges: Vec<Range<usize>> = (0..threads)
        .map(|t| {
            let start = t * per_thread;
            let end = if t == threads - 1 {
                vertex_count
            } else {
                start + per_thread
            };
            start..end
        })
        .collect();

    std::thread::scope(|scope| {
        for (worker, range) in ranges.iter().cloned().enumerate() {
            let shared = &shared;
            tracing::debug!(worker, start = range.start, end = range.end, "relaxation worker");
            scope.spawn(move || worker_loop(kernel, shared, worker, range));
        }

        let mut cadence = Cadence::new();
        let mut a_is_input = true;

        for iteration in 1..=iterations {
            let first = iteration == 1;
            let last = iteration == iterations;
            let pass = cadence.pass_for(iteration, schedule);

            let (input, output): (&[f32], &mut Vec<f32>) = if a_is_input {
                (&*buffer_a, &mut *buffer_b)
            } else {
                (&*buffer_b, &mut *buffer_a)
            };

            // Workers are parked (either not yet released, or counted
            // done), so the serial pre-pass has exclusive access.
            kernel.begin_iteration(input);

            {
                let mut phase = shared.phase.lock().expect("relaxation phase lock");

                if first {
                    // Every worker must be inside its wait loop before
                    // the first release, or the release is missed.
                    while phase.started < threads {
                        phase = shared.condvar.wait(phase).expect("relaxation phase lock");
                    }
                }

                phase.input_ptr = input.as_ptr();
                phase.output_ptr = output.as_mut_ptr();
                phase.pass = pass;
                phase.done = 0;
                phase.stop = last;
                for flag in phase.release.iter_mut() {
                    *flag = true;
                }
                shared.condvar.notify_all();

                while phase.done < threads {
                    phase = shared.condvar.wait(phase).expect("relaxation phase lock");
                }
            }

            maybe_project(output, iteration, schedule);

            if !last {
                a_is_input = !a_is_input;
            }
        }
    });
}

fn worker_loop<K: RelaxKernel>(
    kernel: &K,
    shared: &SharedState,
    worker: usize,
    range: Range<usize>,
) {
    let mut registered = false;
    loop {
        let (input_ptr, output_ptr, len, pass, stop) = {
            let mut phase = shared.phase.lock().expect("relaxation phase lock");
            if !registered {
                registered = true;
                phase.started += 1;
                shared.condvar.notify_all();
            }
            while !phase.release[worker] {
                phase = shared.condvar.wait(phase).expect("relaxation phase lock");
            }
            phase.release[worker] = false;
            (
                phase.input_ptr,
                phase.output_ptr,
                phase.len,
                phase.pass,
                phase.stop,
            )
        };

        // The coordinator keeps both buffers alive and untouched while
        // workers compute; every worker writes only its own range, so
        // the aliased output handle never overlaps another's writes.
        let input = unsafe { std::slice::from_raw_parts(input_ptr, len) };
        let mut output = OutputCoords::new(output_ptr, len);
        kernel.relax_range(&pass, range.clone(), input, &mut output);

        {
            let mut phase = shared.phase.lock().expect("relaxation phase lock");
            phase.done += 1;
            shared.condvar.notify_all();
        }

        if stop {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Shifts every vertex by +1 in X each iteration.
    struct ShiftKernel;

    impl RelaxKernel for ShiftKernel {
        fn relax_range(
            &self,
            _pass: &IterationPass,
            range: std::ops::Range<usize>,
            input: &[f32],
            output: &mut OutputCoords,
        ) {
            for v in range {
                let p = Vec3::new(input[v * 3] + 1.0, input[v * 3 + 1], input[v * 3 + 2]);
                output.write(v, p);
            }
        }
    }

    fn schedule(iterations: u32, threads: usize) -> RelaxSchedule {
        RelaxSchedule {
            iterations,
            edge_every: 0,
            landmark_neighbor_every: 0,
            project_to_sphere_every: 0,
            sphere_radius: 0.0,
            threads,
        }
    }

    #[test]
    fn buffers_accumulate_across_iterations() {
        let initial = vec![0.0f32; 30];
        for iterations in 1..=4 {
            let result = run_relaxation(&ShiftKernel, &initial, &schedule(iterations, 1));
            for v in 0..10 {
                assert_eq!(result[v * 3], iterations as f32);
            }
        }
    }

    #[test]
    fn worker_pool_matches_single_thread() {
        let initial: Vec<f32> = (0..60).map(|i| i as f32).collect();
        let single = run_relaxation(&ShiftKernel, &initial, &schedule(5, 1));
        for threads in [2, 3, 7] {
            let pooled = run_relaxation(&ShiftKernel, &initial, &schedule(5, threads));
            assert_eq!(single, pooled, "{threads} workers diverged");
        }
    }

    #[test]
    fn thread_count_is_clamped_to_vertex_count() {
        let initial = vec![0.0f32; 6];
        let result = run_relaxation(&ShiftKernel, &initial, &schedule(3, 64));
        assert_eq!(result[0], 3.0);
        assert_eq!(result[3], 3.0);
    }

    #[test]
    fn edge_cadence_fires_on_multiples() {
        let mut cadence = Cadence::new();
        let sched = RelaxSchedule {
            edge_every: 2,
            ..schedule(4, 1)
        };
        let flags: Vec<bool> = (1..=4)
            .map(|i| cadence.pass_for(i, &sched).relax_edges)
            .collect();
        assert_eq!(flags, vec![false, true, false, true]);
    }

    #[test]
    fn landmark_cadence_counts_independently() {
        let mut cadence = Cadence::new();
        let sched = RelaxSchedule {
            landmark_neighbor_every: 3,
            ..schedule(6, 1)
        };
        let flags: Vec<bool> = (1..=6)
            .map(|i| cadence.pass_for(i, &sched).relax_landmark_neighbors)
            .collect();
        // The counter starts at 1 and resets after each firing.
        assert_eq!(flags, vec![false, false, true, false, false, true]);
    }
}
