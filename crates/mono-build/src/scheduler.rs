// Copyright (c) 2025 Zensical and contributors

// SPDX-License-Identifier: MIT
// Third-party contributions licensed under DCO

// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to
// deal in the Software without restriction, including without limitation the
// rights to use, copy, modify, merge, publish, distribute, sublicense, and/or
// sell copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:

// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NON-INFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
// FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS
// IN THE SOFTWARE.

// ----------------------------------------------------------------------------

//! Parallel DAG task scheduler.
//!
//! A single-threaded coordinator owns up to `W` concurrent OS-thread
//! workers. Coordinator state (the queue, node statuses, the active count)
//! is only ever touched on the coordinator; worker threads communicate
//! exclusively through a completion channel, so there's no shared mutable
//! state to lock across the boundary. See `SPEC_FULL.md` §9 on why this
//! avoids needing an async runtime: child processes already run in
//! parallel, and a `mpsc` channel is a perfectly good completion selector.

use console::Style;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use crate::error::{Error, Result};

// ----------------------------------------------------------------------------
// Enums
// ----------------------------------------------------------------------------

/// Task status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// Waiting on dependencies or a free worker slot.
    Ready,
    /// Currently running on a worker thread.
    Executing,
    /// Finished cleanly.
    Success,
    /// Finished, but stderr activity was observed.
    SuccessWithWarnings,
    /// Its inputs were unchanged since the last successful run.
    Skipped,
    /// A transitive dependency failed; this task will never run.
    Blocked,
    /// Finished with a non-zero exit or non-empty diagnostics.
    Failure,
}

/// Terminal outcome a runner reports back to the coordinator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Maps to [`Status::Success`].
    Success,
    /// Maps to [`Status::SuccessWithWarnings`].
    SuccessWithWarnings,
    /// Maps to [`Status::Skipped`].
    Skipped,
    /// Maps to [`Status::Failure`].
    Failure,
}

// ----------------------------------------------------------------------------
// Types
// ----------------------------------------------------------------------------

/// A task's unit of work.
///
/// Receives whether incremental skipping is currently permitted for this
/// task (`false` once any dependency completed with a plain `Success` rather
/// than `Skipped`), and a writer to stream output into. Returns the terminal
/// [`Outcome`].
pub type Runner = Box<dyn FnOnce(bool, &mut dyn Write) -> Outcome + Send>;

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// A registered task node.
struct Node {
    deps: BTreeSet<String>,
    dependents: BTreeSet<String>,
    status: Status,
    incremental_allowed: bool,
    critical_path_length: u32,
    runner: Option<Runner>,
}

/// Per-task output buffer, flushed to the console in finish order.
#[derive(Clone, Default)]
struct TaskWriter(Arc<Mutex<Vec<u8>>>);

impl Write for TaskWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// A single terminal report, handed back after [`Scheduler::execute`].
#[derive(Debug, Default)]
pub struct Report {
    /// Final status for every registered task, in registration order.
    pub statuses: Vec<(String, Status)>,
}

/// Parallel DAG executor.
pub struct Scheduler {
    nodes: BTreeMap<String, Node>,
    order: Vec<String>,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Scheduler {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self { nodes: BTreeMap::new(), order: Vec::new() }
    }

    /// Registers a task.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateTask`] if `name` is already registered.
    pub fn add_task<S>(&mut self, name: S, runner: Runner) -> Result<()>
    where
        S: Into<String>,
    {
        let name = name.into();
        if self.nodes.contains_key(&name) {
            return Err(Error::DuplicateTask(name));
        }
        self.order.push(name.clone());
        self.nodes.insert(
            name,
            Node {
                deps: BTreeSet::new(),
                dependents: BTreeSet::new(),
                status: Status::Ready,
                incremental_allowed: true,
                critical_path_length: 0,
                runner: Some(runner),
            },
        );
        Ok(())
    }

    /// Wires `name` to depend on every task in `deps`, maintaining the
    /// inverse (dependents) edges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownDependency`] if `name` or any of `deps` was
    /// never registered via [`Scheduler::add_task`].
    pub fn add_dependencies<S, I, D>(&mut self, name: S, deps: I) -> Result<()>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = D>,
        D: Into<String>,
    {
        let name = name.as_ref();
        if !self.nodes.contains_key(name) {
            return Err(Error::UnknownDependency { task: name.to_string(), dependency: name.to_string() });
        }
        for dep in deps {
            let dep = dep.into();
            if !self.nodes.contains_key(&dep) {
                return Err(Error::UnknownDependency { task: name.to_string(), dependency: dep });
            }
            self.nodes.get_mut(name).unwrap().deps.insert(dep.clone());
            self.nodes.get_mut(&dep).unwrap().dependents.insert(name.to_string());
        }
        Ok(())
    }

    /// Runs every registered task to completion, honoring dependency order,
    /// up to `parallelism` concurrent workers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cycle`] if the task graph isn't a DAG, and
    /// [`Error::Failed`] if any task terminated with [`Status::Failure`].
    pub fn execute(mut self, parallelism: usize) -> Result<Report> {
        self.check_acyclic()?;
        self.compute_critical_path_lengths();

        let parallelism = parallelism.max(1);
        let mut queue: Vec<String> = self.order.clone();
        queue.sort_by(|a, b| {
            let cpl_a = self.nodes[a].critical_path_length;
            let cpl_b = self.nodes[b].critical_path_length;
            cpl_b.cmp(&cpl_a).then_with(|| a.cmp(b))
        });

        let (tx, rx) = mpsc::channel::<(String, Outcome, Vec<u8>)>();
        let mut active = 0usize;
        let styled = Style::new();

        loop {
            // Drop anything no longer Ready from the front of the queue.
            queue.retain(|name| self.nodes[name].status == Status::Ready);

            while active < parallelism {
                let Some(pos) = queue.iter().position(|name| self.nodes[name].deps.is_empty()) else {
                    break;
                };
                let name = queue.remove(pos);
                let node = self.nodes.get_mut(&name).unwrap();
                node.status = Status::Executing;
                let runner = node.runner.take().expect("task runner already consumed");
                let incremental_allowed = node.incremental_allowed;

                let tx = tx.clone();
                let writer = TaskWriter::default();
                let mut worker_writer = writer.clone();
                let task_name = name.clone();
                thread::spawn(move || {
                    let outcome = runner(incremental_allowed, &mut worker_writer);
                    let buffer = writer.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone();
                    let _ = tx.send((task_name, outcome, buffer));
                });
                active += 1;
            }

            let still_pending = self.nodes.values().any(|n| matches!(n.status, Status::Ready | Status::Executing));
            if !still_pending {
                break;
            }

            let Ok((name, outcome, buffer)) = rx.recv() else {
                break;
            };
            active -= 1;

            print_buffer(&styled, &name, &buffer);
            self.complete(&name, outcome);
        }

        let failures = self.nodes.values().filter(|n| n.status == Status::Failure).count();
        let statuses = self.order.iter().map(|name| (name.clone(), self.nodes[name].status)).collect();
        let report = Report { statuses };
        if failures > 0 {
            Err(Error::Failed(failures))
        } else {
            Ok(report)
        }
    }

    /// Applies a task's terminal outcome: updates its status, propagates to
    /// dependents, and recursively blocks transitive dependents on failure.
    fn complete(&mut self, name: &str, outcome: Outcome) {
        let status = match outcome {
            Outcome::Success => Status::Success,
            Outcome::SuccessWithWarnings => Status::SuccessWithWarnings,
            Outcome::Skipped => Status::Skipped,
            Outcome::Failure => Status::Failure,
        };
        self.nodes.get_mut(name).unwrap().status = status;

        match status {
            Status::Success | Status::SuccessWithWarnings | Status::Skipped => {
                let invalidate = !matches!(status, Status::Skipped);
                let dependents: Vec<String> = self.nodes[name].dependents.iter().cloned().collect();
                for dependent in dependents {
                    if let Some(node) = self.nodes.get_mut(&dependent) {
                        node.deps.remove(name);
                        if invalidate {
                            node.incremental_allowed = false;
                        }
                    }
                }
            }
            Status::Failure => {
                let dependents: Vec<String> = self.nodes[name].dependents.iter().cloned().collect();
                for dependent in dependents {
                    self.block(&dependent);
                }
            }
            Status::Ready | Status::Executing | Status::Blocked => {}
        }
    }

    /// Recursively marks a task and all of its dependents as [`Status::Blocked`].
    fn block(&mut self, name: &str) {
        let node = self.nodes.get_mut(name).unwrap();
        if node.status == Status::Blocked {
            return;
        }
        node.status = Status::Blocked;
        let dependents: Vec<String> = self.nodes[name].dependents.iter().cloned().collect();
        for dependent in dependents {
            self.block(&dependent);
        }
    }

    /// Verifies the task graph has no cycles, by recursive descent from
    /// every node's dependents.
    fn check_acyclic(&self) -> Result<()> {
        #[derive(PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }
        let mut marks: BTreeMap<&str, Mark> = BTreeMap::new();

        fn visit<'a>(
            name: &'a str, nodes: &'a BTreeMap<String, Node>, marks: &mut BTreeMap<&'a str, Mark>,
            path: &mut Vec<&'a str>,
        ) -> Result<()> {
            match marks.get(name) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => {
                    path.push(name);
                    return Err(Error::Cycle(path.join(" -> ")));
                }
                None => {}
            }
            marks.insert(name, Mark::Visiting);
            path.push(name);
            for dependent in &nodes[name].dependents {
                visit(dependent, nodes, marks, path)?;
            }
            path.pop();
            marks.insert(name, Mark::Done);
            Ok(())
        }

        for name in self.nodes.keys() {
            let mut path = Vec::new();
            visit(name, &self.nodes, &mut marks, &mut path)?;
        }
        Ok(())
    }

    /// Computes each node's critical-path length: `1 + max(CPL of
    /// dependents)`, with a leaf-dependent (no dependents) at CPL 0.
    fn compute_critical_path_lengths(&mut self) {
        fn cpl(name: &str, nodes: &BTreeMap<String, Node>, memo: &mut BTreeMap<String, u32>) -> u32 {
            if let Some(&value) = memo.get(name) {
                return value;
            }
            let dependents = &nodes[name].dependents;
            let value = if dependents.is_empty() {
                0
            } else {
                1 + dependents.iter().map(|d| cpl(d, nodes, memo)).max().unwrap_or(0)
            };
            memo.insert(name.to_string(), value);
            value
        }

        let mut memo = BTreeMap::new();
        let names: Vec<String> = self.nodes.keys().cloned().collect();
        for name in &names {
            let value = cpl(name, &self.nodes, &mut memo);
            self.nodes.get_mut(name).unwrap().critical_path_length = value;
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Flushes one task's buffered output to the console, in finish order.
fn print_buffer(style: &Style, name: &str, buffer: &[u8]) {
    if buffer.is_empty() {
        return;
    }
    let text = String::from_utf8_lossy(buffer);
    println!("{}", style.clone().bold().apply_to(format!("== {name} =="))) ;
    print!("{text}");
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn task(outcome: Outcome) -> Runner {
        Box::new(move |_, _| outcome)
    }

    #[test]
    fn runs_independent_tasks() {
        let mut scheduler = Scheduler::new();
        scheduler.add_task("a", task(Outcome::Success)).unwrap();
        scheduler.add_task("b", task(Outcome::Success)).unwrap();
        let report = scheduler.execute(2).unwrap();
        assert_eq!(report.statuses.len(), 2);
        assert!(report.statuses.iter().all(|(_, status)| *status == Status::Success));
    }

    #[test]
    fn blocks_dependents_on_failure() {
        let mut scheduler = Scheduler::new();
        scheduler.add_task("a", task(Outcome::Failure)).unwrap();
        scheduler.add_task("b", task(Outcome::Success)).unwrap();
        scheduler.add_dependencies("b", ["a"]).unwrap();

        let err = scheduler.execute(2).unwrap_err();
        assert!(matches!(err, Error::Failed(1)));
    }

    #[test]
    fn detects_cycle() {
        let mut scheduler = Scheduler::new();
        scheduler.add_task("a", task(Outcome::Success)).unwrap();
        scheduler.add_task("b", task(Outcome::Success)).unwrap();
        scheduler.add_dependencies("a", ["b"]).unwrap();
        scheduler.add_dependencies("b", ["a"]).unwrap();

        let err = scheduler.execute(2).unwrap_err();
        assert!(matches!(err, Error::Cycle(_)));
    }

    #[test]
    fn rejects_duplicate_task() {
        let mut scheduler = Scheduler::new();
        scheduler.add_task("a", task(Outcome::Success)).unwrap();
        let err = scheduler.add_task("a", task(Outcome::Success)).unwrap_err();
        assert!(matches!(err, Error::DuplicateTask(_)));
    }

    #[test]
    fn computes_critical_path_order() {
        // t1 -> t3 -> t5, t2 -> t3, t4 -> t5
        let mut scheduler = Scheduler::new();
        for name in ["t1", "t2", "t3", "t4", "t5"] {
            scheduler.add_task(name, task(Outcome::Success)).unwrap();
        }
        scheduler.add_dependencies("t3", ["t1", "t2"]).unwrap();
        scheduler.add_dependencies("t5", ["t3", "t4"]).unwrap();

        scheduler.compute_critical_path_lengths();
        assert_eq!(scheduler.nodes["t5"].critical_path_length, 0);
        assert_eq!(scheduler.nodes["t3"].critical_path_length, 1);
        assert_eq!(scheduler.nodes["t4"].critical_path_length, 1);
        assert_eq!(scheduler.nodes["t1"].critical_path_length, 2);
        assert_eq!(scheduler.nodes["t2"].critical_path_length, 2);
    }

    #[test]
    fn skip_does_not_invalidate_incremental_eligibility() {
        let mut scheduler = Scheduler::new();
        scheduler.add_task("a", task(Outcome::Skipped)).unwrap();
        scheduler.add_task("b", task(Outcome::Success)).unwrap();
        scheduler.add_dependencies("b", ["a"]).unwrap();

        // After "a" completes as Skipped, "b" should still be incremental-eligible.
        scheduler.compute_critical_path_lengths();
        scheduler.complete("a", Outcome::Skipped);
        assert!(scheduler.nodes["b"].incremental_allowed);
    }

    #[test]
    fn success_invalidates_dependents_incremental_eligibility() {
        let mut scheduler = Scheduler::new();
        scheduler.add_task("a", task(Outcome::Success)).unwrap();
        scheduler.add_task("b", task(Outcome::Success)).unwrap();
        scheduler.add_dependencies("b", ["a"]).unwrap();

        scheduler.compute_critical_path_lengths();
        scheduler.complete("a", Outcome::Success);
        assert!(!scheduler.nodes["b"].incremental_allowed);
    }
}
