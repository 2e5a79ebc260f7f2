use perf_monitor::monitor::cpu::{SystemThreadProbe, ThreadProbe};
use perf_monitor::monitor::gpu::{GpuSource, SystemGpuSource};
use perf_monitor::monitor::memory::{MemoryProbe, SystemMemoryProbe};

fn main() {
    match SystemThreadProbe.sample_threads() {
        Ok(threads) => {
            for (idx, thread) in threads.iter().enumerate() {
                println!("thread {idx}: usage {}, idle {}", thread.usage, thread.idle);
            }
        }
        Err(err) => println!("threads: {err}"),
    }

    match SystemMemoryProbe::new().resident_bytes() {
        Ok(bytes) => println!("resident bytes: {bytes}"),
        Err(err) => println!("memory: {err}"),
    }

    match SystemGpuSource.utilization() {
        Ok(Some(pct)) => println!("gpu utilization: {pct}%"),
        Ok(None) => println!("No GPU accelerator statistics found"),
        Err(err) => println!("gpu: {err}"),
    }
}
