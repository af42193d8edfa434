//! C-ABI entry points for host runtimes loading this crate as a shared
//! library.
//!
//! String returns are ownership transfers: the host must hand every non-null
//! pointer back to [`vcx_string_free`]. Failures are logged and reported
//! through sentinel returns (null pointer, `-1`, or a non-zero status).

use crate::commands::{collect, count, filter, merge};
use crate::utils::util::clamp_workers;
use std::ffi::{CStr, CString, c_char, c_int};
use std::path::Path;

/// Borrows a UTF-8 string from the host.
///
/// # Safety
/// `ptr` must be a valid, NUL-terminated C string.
unsafe fn host_str<'a>(ptr: *const c_char, label: &str) -> Option<&'a str> {
    if ptr.is_null() {
        log::error!("{label} must not be null");
        return None;
    }
    match unsafe { CStr::from_ptr(ptr) }.to_str() {
        Ok(text) => Some(text),
        Err(error) => {
            log::error!("{label} is not valid UTF-8: {error}");
            None
        }
    }
}

fn into_host_string(text: String) -> *mut c_char {
    match CString::new(text) {
        Ok(c_string) => c_string.into_raw(),
        Err(error) => {
            log::error!("Result contains an interior NUL byte: {error}");
            std::ptr::null_mut()
        }
    }
}

/// # Safety
/// `vcf_path` must be a valid, NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn vcx_collect_all(
    vcf_path: *const c_char,
    is_gzip: bool,
    num_cpu: c_int,
) -> *mut c_char {
    let Some(path) = (unsafe { host_str(vcf_path, "vcf_path") }) else {
        return std::ptr::null_mut();
    };
    match collect::collect_all(Path::new(path), is_gzip, clamp_workers(num_cpu.into())) {
        Ok(json) => into_host_string(json),
        Err(error) => {
            log::error!("CollectAll failed: {error}");
            std::ptr::null_mut()
        }
    }
}

/// # Safety
/// `vcf_path` must be a valid, NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn vcx_collect(
    num_rows: i64,
    start_row: i64,
    vcf_path: *const c_char,
    is_gzip: bool,
    num_cpu: c_int,
) -> *mut c_char {
    let Some(path) = (unsafe { host_str(vcf_path, "vcf_path") }) else {
        return std::ptr::null_mut();
    };
    let num_rows = num_rows.max(0) as u64;
    let start_row = start_row.max(0) as u64;
    match collect::collect(
        num_rows,
        start_row,
        Path::new(path),
        is_gzip,
        clamp_workers(num_cpu.into()),
    ) {
        Ok(json) => into_host_string(json),
        Err(error) => {
            log::error!("Collect failed: {error}");
            std::ptr::null_mut()
        }
    }
}

/// # Safety
/// `vcf_path` must be a valid, NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn vcx_count(vcf_path: *const c_char, is_gzip: bool) -> i64 {
    let Some(path) = (unsafe { host_str(vcf_path, "vcf_path") }) else {
        return -1;
    };
    match count::count(Path::new(path), is_gzip) {
        Ok(rows) => rows as i64,
        Err(error) => {
            log::error!("Count failed: {error}");
            -1
        }
    }
}

/// # Safety
/// `include`, `input_path` and `output_path` must be valid, NUL-terminated C
/// strings.
#[no_mangle]
pub unsafe extern "C" fn vcx_filter(
    include: *const c_char,
    input_path: *const c_char,
    output_path: *const c_char,
    is_gzip: bool,
    num_cpu: c_int,
) -> c_int {
    let (Some(include), Some(input), Some(output)) = (unsafe {
        (
            host_str(include, "include"),
            host_str(input_path, "input_path"),
            host_str(output_path, "output_path"),
        )
    }) else {
        return 1;
    };
    match filter::filter(
        include,
        Path::new(input),
        Path::new(output),
        is_gzip,
        clamp_workers(num_cpu.into()),
    ) {
        Ok(()) => 0,
        Err(error) => {
            log::error!("Filter failed: {error}");
            1
        }
    }
}

/// # Safety
/// `vcf1`, `vcf2` and `output_path` must be valid, NUL-terminated C strings.
#[no_mangle]
pub unsafe extern "C" fn vcx_merge(
    vcf1: *const c_char,
    vcf2: *const c_char,
    output_path: *const c_char,
) -> c_int {
    let (Some(vcf1), Some(vcf2), Some(output)) = (unsafe {
        (
            host_str(vcf1, "vcf1"),
            host_str(vcf2, "vcf2"),
            host_str(output_path, "output_path"),
        )
    }) else {
        return 1;
    };
    match merge::merge(Path::new(vcf1), Path::new(vcf2), Path::new(output)) {
        Ok(()) => 0,
        Err(error) => {
            log::error!("Merge failed: {error}");
            1
        }
    }
}

/// Reclaims a string previously returned by this library.
///
/// # Safety
/// `ptr` must be null or a pointer obtained from one of this library's
/// string-returning entry points, and must not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn vcx_string_free(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(unsafe { CString::from_raw(ptr) });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn c_string(text: &str) -> CString {
        CString::new(text).expect("test string should not contain NUL")
    }

    #[test]
    fn count_reports_minus_one_for_missing_file() {
        let path = c_string("/no/such/file.vcf");
        let observed = unsafe { vcx_count(path.as_ptr(), false) };
        assert_eq!(observed, -1);
    }

    #[test]
    fn count_reports_minus_one_for_null_path() {
        let observed = unsafe { vcx_count(std::ptr::null(), false) };
        assert_eq!(observed, -1);
    }

    #[test]
    fn collect_all_roundtrips_through_the_c_abi() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let vcf = dir.path().join("input.vcf");
        std::fs::write(&vcf, "#CHROM\tPOS\nchr1\t100\t.\tA\tG\t5\tPASS\tDP=1\n")
            .expect("fixture should be written");

        let path = c_string(vcf.to_str().expect("temp path should be UTF-8"));
        let json_ptr = unsafe { vcx_collect_all(path.as_ptr(), false, 0) };
        assert!(!json_ptr.is_null());

        let json = unsafe { CStr::from_ptr(json_ptr) }
            .to_str()
            .expect("returned JSON should be UTF-8")
            .to_string();
        unsafe { vcx_string_free(json_ptr) };

        let rows: serde_json::Value = serde_json::from_str(&json).expect("JSON should parse");
        assert_eq!(rows.as_array().expect("array expected").len(), 1);
    }

    #[test]
    fn filter_reports_failure_status_for_bad_expression() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let vcf = dir.path().join("input.vcf");
        std::fs::write(&vcf, "#CHROM\tPOS\n").expect("fixture should be written");

        let include = c_string("QUAL >");
        let input = c_string(vcf.to_str().expect("temp path should be UTF-8"));
        let output = c_string(
            dir.path()
                .join("out.vcf")
                .to_str()
                .expect("temp path should be UTF-8"),
        );
        let status =
            unsafe { vcx_filter(include.as_ptr(), input.as_ptr(), output.as_ptr(), false, 1) };
        assert_eq!(status, 1);
    }
}
