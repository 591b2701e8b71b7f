use std::time::Duration;

/// Platform-specific high-precision sleep. Plain `thread::sleep` routinely
/// overshoots by a scheduler quantum; the paradigm loops poll at 1-10 ms, so
/// the overshoot would dominate the step.
pub fn high_precision_sleep(duration: Duration) {
    #[cfg(target_os = "windows")]
    windows_sleep(duration);
    #[cfg(target_os = "linux")]
    linux_sleep(duration);
    #[cfg(target_os = "macos")]
    macos_sleep(duration);
    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    std::thread::sleep(duration);
}

#[cfg(target_os = "windows")]
fn windows_sleep(duration: Duration) {
    use windows::Win32::Foundation::CloseHandle;
    use windows::Win32::System::Threading::{
        CreateWaitableTimerW, SetWaitableTimer, WaitForSingleObject, INFINITE,
    };

    unsafe {
        let Ok(timer) = CreateWaitableTimerW(None, true, None) else {
            std::thread::sleep(duration);
            return;
        };

        // Negative due time = relative wait, in 100 ns intervals.
        let due_time = -(duration.as_nanos() as i64 / 100);

        if SetWaitableTimer(timer, &due_time, 0, None, None, false).is_ok() {
            WaitForSingleObject(timer, INFINITE);
        }

        let _ = CloseHandle(timer);
    }
}

#[cfg(target_os = "linux")]
fn linux_sleep(duration: Duration) {
    use libc::{clock_nanosleep, timespec, CLOCK_MONOTONIC};

    let req = timespec {
        tv_sec: duration.as_secs() as libc::time_t,
        tv_nsec: duration.subsec_nanos() as libc::c_long,
    };

    unsafe {
        clock_nanosleep(CLOCK_MONOTONIC, 0, &req, std::ptr::null_mut());
    }
}

#[cfg(target_os = "macos")]
fn macos_sleep(duration: Duration) {
    use mach2::mach_time::{mach_absolute_time, mach_timebase_info, mach_timebase_info_data_t};
    use std::thread;

    if duration.as_nanos() < 100_000 {
        unsafe {
            let start = mach_absolute_time();
            let mut timebase = mach_timebase_info_data_t { numer: 0, denom: 0 };
            mach_timebase_info(&mut timebase);

            let target_ticks =
                duration.as_nanos() as u64 * timebase.denom as u64 / timebase.numer as u64;

            while mach_absolute_time() - start < target_ticks {
                std::hint::spin_loop();
            }
        }
    } else {
        thread::sleep(duration);
    }
}
