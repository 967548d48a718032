//! Locating the game window by the name of its process.

use anyhow::{anyhow, Result};
use std::ffi::OsString;
use std::os::windows::ffi::OsStringExt;

use windows::Win32::Foundation::{CloseHandle, BOOL, HWND, LPARAM, POINT, RECT, TRUE};
use windows::Win32::Graphics::Gdi::ClientToScreen;
use windows::Win32::System::Threading::{
    OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_WIN32, PROCESS_QUERY_LIMITED_INFORMATION,
};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetClientRect, GetWindowRect, GetWindowTextLengthW, GetWindowThreadProcessId,
    IsWindowVisible,
};

/// Executable file name of the process owning `hwnd`, if it can be queried.
unsafe fn process_file_name(hwnd: HWND) -> Option<String> {
    unsafe {
        let mut process_id: u32 = 0;
        GetWindowThreadProcessId(hwnd, Some(&mut process_id));
        if process_id == 0 {
            return None;
        }

        let handle = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, process_id).ok()?;

        let mut name_buf: Vec<u16> = vec![0; 1024];
        let mut len = name_buf.len() as u32;
        let result = QueryFullProcessImageNameW(
            handle,
            PROCESS_NAME_WIN32,
            windows::core::PWSTR(name_buf.as_mut_ptr()),
            &mut len,
        );
        let _ = CloseHandle(handle);

        if result.is_err() || len == 0 {
            return None;
        }

        let full_path = OsString::from_wide(&name_buf[..len as usize])
            .to_string_lossy()
            .to_string();
        full_path.rsplit('\\').next().map(str::to_string)
    }
}

/// Finds the first visible, titled window owned by a process called
/// `process_name` (case-insensitive, file name only).
pub fn find_window_by_process(process_name: &str) -> Result<HWND> {
    struct EnumData {
        wanted: String,
        hwnd: Option<HWND>,
    }

    unsafe extern "system" fn enum_callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
        unsafe {
            let data = &mut *(lparam.0 as *mut EnumData);

            if !IsWindowVisible(hwnd).as_bool() || GetWindowTextLengthW(hwnd) == 0 {
                return TRUE;
            }

            match process_file_name(hwnd) {
                Some(name) if name.to_lowercase() == data.wanted => {
                    data.hwnd = Some(hwnd);
                    BOOL(0) // Stop enumeration
                }
                _ => TRUE,
            }
        }
    }

    let mut data = EnumData {
        wanted: process_name.to_lowercase(),
        hwnd: None,
    };
    unsafe {
        // EnumWindows reports FALSE when the callback stops it early
        let _ = EnumWindows(Some(enum_callback), LPARAM(&mut data as *mut _ as isize));
    }

    data.hwnd
        .ok_or_else(|| anyhow!("Could not find a {} window. Is the game running?", process_name))
}

/// Client area rectangle and its offset from the window's top-left corner.
///
/// Window captures include the title bar and borders; the offset is what has
/// to be cropped away to keep only the game's own pixels.
pub fn get_client_area_info(hwnd: HWND) -> Result<(RECT, POINT)> {
    let mut client_rect = RECT::default();
    unsafe { GetClientRect(hwnd, &mut client_rect)? };

    let mut client_origin = POINT { x: 0, y: 0 };
    unsafe {
        if !ClientToScreen(hwnd, &mut client_origin).as_bool() {
            return Err(anyhow!("ClientToScreen failed"));
        }
    }

    let mut window_rect = RECT::default();
    unsafe { GetWindowRect(hwnd, &mut window_rect)? };

    let offset = POINT {
        x: client_origin.x - window_rect.left,
        y: client_origin.y - window_rect.top,
    };

    Ok((client_rect, offset))
}
