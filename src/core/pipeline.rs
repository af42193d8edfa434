use crate::constants::{LINE_QUEUE_CAPACITY, RESULT_QUEUE_CAPACITY};
use crate::utils::util::Result;
use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded};
use std::thread;

/// Reader / worker-pool / sink harness shared by the bulk operations.
///
/// The calling thread acts as both reader and sink: it feeds lines into a
/// bounded queue, opportunistically draining finished results between pushes,
/// and performs a final blocking drain once the workers have exhausted the
/// closed line queue. Workers are plain `line -> Option<output>` functions;
/// output order is not related to input order.
pub struct Pipeline {
    workers: usize,
    line_capacity: usize,
    result_capacity: usize,
}

impl Pipeline {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            line_capacity: LINE_QUEUE_CAPACITY,
            result_capacity: RESULT_QUEUE_CAPACITY,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_capacities(
        workers: usize,
        line_capacity: usize,
        result_capacity: usize,
    ) -> Self {
        Self {
            workers: workers.max(1),
            line_capacity,
            result_capacity,
        }
    }

    pub fn run<I, T, W, S>(&self, lines: I, worker: W, mut sink: S) -> Result<()>
    where
        I: Iterator<Item = Result<String>>,
        T: Send,
        W: Fn(String) -> Option<T> + Sync,
        S: FnMut(T) -> Result<()>,
    {
        let (line_sender, line_receiver) = bounded::<String>(self.line_capacity);
        let (result_sender, result_receiver) = bounded::<T>(self.result_capacity);

        thread::scope(|scope| -> Result<()> {
            for _ in 0..self.workers {
                let line_receiver = line_receiver.clone();
                let result_sender = result_sender.clone();
                let worker = &worker;
                scope.spawn(move || {
                    for line in line_receiver {
                        if let Some(output) = worker(line) {
                            if result_sender.send(output).is_err() {
                                break;
                            }
                        }
                    }
                });
            }
            drop(line_receiver);
            drop(result_sender);

            let mut outcome = feed(lines, &line_sender, &result_receiver, &mut sink);
            drop(line_sender);

            if outcome.is_ok() {
                for output in result_receiver.iter() {
                    if let Err(error) = sink(output) {
                        outcome = Err(error);
                        break;
                    }
                }
            }
            if outcome.is_err() {
                // Workers drain the closed line queue; discard whatever they
                // still produce so they can terminate before the first error
                // is surfaced.
                for _ in result_receiver.iter() {}
            }
            outcome
        })
    }
}

fn feed<I, T, S>(
    lines: I,
    line_sender: &Sender<String>,
    result_receiver: &Receiver<T>,
    sink: &mut S,
) -> Result<()>
where
    I: Iterator<Item = Result<String>>,
    S: FnMut(T) -> Result<()>,
{
    for line in lines {
        let line = line?;
        loop {
            match result_receiver.try_recv() {
                Ok(output) => sink(output)?,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        if line_sender.send(line).is_err() {
            return Err(crate::vcx_error!(
                "Worker pool terminated before the end of input"
            ));
        }
    }
    Ok(())
}
