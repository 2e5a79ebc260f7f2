//! Per-thread CPU usage through the Mach task/thread APIs.

use super::cpu::ThreadUsage;
use crate::error::ProbeError;
use mach2::kern_return::{kern_return_t, KERN_SUCCESS};
use mach2::mach_port::mach_port_deallocate;
use mach2::mach_types::{thread_act_array_t, thread_act_t};
use mach2::message::mach_msg_type_number_t;
use mach2::task::task_threads;
use mach2::traps::mach_task_self;
use mach2::vm::mach_vm_deallocate;
use std::mem;
use std::ptr;

const THREAD_BASIC_INFO: u32 = 3;
const TH_FLAGS_IDLE: i32 = 0x2;

#[repr(C)]
#[derive(Default)]
#[allow(dead_code)]
struct TimeValue {
    seconds: i32,
    microseconds: i32,
}

#[repr(C)]
#[derive(Default)]
#[allow(dead_code)]
struct ThreadBasicInfo {
    user_time: TimeValue,
    system_time: TimeValue,
    cpu_usage: i32,
    policy: i32,
    run_state: i32,
    flags: i32,
    suspend_count: i32,
    sleep_time: i32,
}

const THREAD_BASIC_INFO_COUNT: mach_msg_type_number_t =
    (mem::size_of::<ThreadBasicInfo>() / mem::size_of::<i32>()) as mach_msg_type_number_t;

extern "C" {
    fn thread_info(
        target_act: thread_act_t,
        flavor: u32,
        thread_info_out: *mut i32,
        thread_info_out_cnt: *mut mach_msg_type_number_t,
    ) -> kern_return_t;
}

/// Thread port array handed out by `task_threads`. Releases every port and
/// the array itself on drop.
struct ThreadList {
    threads: thread_act_array_t,
    count: mach_msg_type_number_t,
}

impl ThreadList {
    fn for_current_task() -> Result<Self, ProbeError> {
        let mut threads: thread_act_array_t = ptr::null_mut();
        let mut count: mach_msg_type_number_t = 0;
        let kr = unsafe { task_threads(mach_task_self(), &mut threads, &mut count) };
        if kr != KERN_SUCCESS {
            return Err(ProbeError::Kernel {
                call: "task_threads",
                code: kr,
            });
        }
        Ok(Self { threads, count })
    }

    fn as_slice(&self) -> &[thread_act_t] {
        if self.threads.is_null() {
            return &[];
        }
        unsafe { std::slice::from_raw_parts(self.threads, self.count as usize) }
    }
}

impl Drop for ThreadList {
    fn drop(&mut self) {
        if self.threads.is_null() {
            return;
        }
        unsafe {
            let task = mach_task_self();
            for &thread in self.as_slice() {
                mach_port_deallocate(task, thread);
            }
            let size = self.count as usize * mem::size_of::<thread_act_t>();
            let kr = mach_vm_deallocate(task, self.threads as u64, size as u64);
            if kr != KERN_SUCCESS {
                log::warn!("mach_vm_deallocate of thread list failed: {kr}");
            }
        }
    }
}

fn basic_info(thread: thread_act_t) -> Result<ThreadBasicInfo, ProbeError> {
    let mut info = ThreadBasicInfo::default();
    let mut count = THREAD_BASIC_INFO_COUNT;
    let kr = unsafe {
        thread_info(
            thread,
            THREAD_BASIC_INFO,
            &mut info as *mut ThreadBasicInfo as *mut i32,
            &mut count,
        )
    };
    if kr != KERN_SUCCESS {
        return Err(ProbeError::Kernel {
            call: "thread_info",
            code: kr,
        });
    }
    Ok(info)
}

pub fn task_thread_usage() -> Result<Vec<ThreadUsage>, ProbeError> {
    thread_usage_with(basic_info)
}

/// The thread list is released on every return path, including when `query`
/// fails part way through.
fn thread_usage_with<F>(mut query: F) -> Result<Vec<ThreadUsage>, ProbeError>
where
    F: FnMut(thread_act_t) -> Result<ThreadBasicInfo, ProbeError>,
{
    let list = ThreadList::for_current_task()?;
    list.as_slice()
        .iter()
        .map(|&thread| {
            query(thread).map(|info| ThreadUsage {
                usage: info.cpu_usage,
                idle: info.flags & TH_FLAGS_IDLE != 0,
            })
        })
        .collect()
}
