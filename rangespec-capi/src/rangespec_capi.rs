use anyhow::Result;
use librangespec::RangeSet;
use std::ffi::{c_int, CStr, CString};

use std::os::raw::c_char;

const DEFAULT_ERROR: &str = "Unknown error";

#[no_mangle]
/// Parse a range specification
///
/// `rs_parse()` parses the comma-separated range specification passed in
/// `spec` and returns its canonical range set. In case of error, NULL is
/// returned and `*error` is set to a newly allocated string containing the
/// error message unless NULL was passed.
///
/// # Safety
///
/// `spec` must be a valid NUL-terminated string.
///
/// The caller must free the range set by calling `rs_free_rangeset()` in case
/// of success.
///
/// The caller must free the error string by calling `rs_free_error()` in case
/// of error.
///
pub unsafe extern "C" fn rs_parse(spec: *const c_char, error: *mut *mut c_char) -> *mut RangeSet {
    let res = (|| -> Result<*mut RangeSet> {
        let spec = unsafe { CStr::from_ptr(spec) }.to_str()?;
        Ok(Box::into_raw(Box::new(librangespec::parse(spec))))
    })();

    match res {
        Ok(res) => res,
        Err(e) => {
            ffi_error(e, error);
            std::ptr::null_mut()
        }
    }
}

#[no_mangle]
/// Expand a range specification into a list of members
///
/// `rs_list()` parses the range specification passed in `spec` and sets
/// `*members` to a newly allocated array of member strings on success, in
/// canonical order. `*len` is set to the number of members. In case of error,
/// `*error` is set to a newly allocated string containing the error message
/// unless NULL was passed.
///
/// # Safety
///
/// The caller must free the members array by calling `rs_free_member_list()`
/// in case of success.
///
/// The caller must free the error string by calling `rs_free_error()` in case
/// of error.
///
/// # Return value
///
/// Returns 0 on success, 1 on error.
///
pub unsafe extern "C" fn rs_list(
    spec: *const c_char,
    len: *mut usize,
    members: *mut *mut *mut c_char,
    error: *mut *mut c_char,
) -> c_int {
    let mut c_members = vec![];

    let res = (|| -> Result<()> {
        let spec = unsafe { CStr::from_ptr(spec) }.to_str()?;

        for member in librangespec::parse(spec).iter() {
            c_members.push(CString::new(member)?.into_raw());
        }

        Ok(())
    })();

    match res {
        Ok(_) => {
            unsafe { *len = c_members.len() }
            let c_members = c_members.into_boxed_slice();
            *members = Box::into_raw(c_members) as *mut *mut c_char;
            0
        }
        Err(e) => {
            for member in c_members {
                unsafe {
                    let _ = CString::from_raw(member);
                };
            }
            ffi_error(e, error);

            1
        }
    }
}

#[no_mangle]
/// Compute the canonical text of a range set
///
/// `rs_fold()` returns a string containing the canonical representation of
/// the range set. NULL is returned if an error occured and `*error` is set to
/// a newly allocated string containing the error message unless NULL was
/// passed.
///
/// # Safety
///
/// `set` must be a valid range set returned by this library.
///
/// The caller must free the string by calling `rs_free_member()`.
///
pub unsafe extern "C" fn rs_fold(set: *const RangeSet, error: *mut *mut c_char) -> *mut c_char {
    let res = (|| -> Result<CString> {
        let set = unsafe { &*set };
        Ok(CString::new(set.to_string())?)
    })();

    match res {
        Ok(res) => res.into_raw(),
        Err(e) => {
            ffi_error(e, error);
            std::ptr::null_mut()
        }
    }
}

#[no_mangle]
/// Count the number of members in a range set
///
/// The count saturates at `UINT64_MAX`.
///
/// # Safety
///
/// `set` must be a valid range set returned by this library.
///
pub unsafe extern "C" fn rs_count(set: *const RangeSet) -> u64 {
    unsafe { &*set }.len()
}

#[no_mangle]
/// Compute the union of two range sets
///
/// `rs_union()` returns a new range set containing members that are in either
/// `set1` or `set2`.
///
/// # Safety
///
/// `set1` and `set2` must be valid range sets returned by this library.
///
/// The resulting range set must be freed by calling `rs_free_rangeset()`.
///
pub unsafe extern "C" fn rs_union(set1: *const RangeSet, set2: *const RangeSet) -> *mut RangeSet {
    let res = unsafe { &*set1 }.union(unsafe { &*set2 });
    Box::into_raw(Box::new(res))
}

#[no_mangle]
/// Compute the intersection of two range sets
///
/// `rs_intersection()` returns a new range set containing members that are in
/// both `set1` and `set2`.
///
/// # Safety
///
/// `set1` and `set2` must be valid range sets returned by this library.
///
/// The resulting range set must be freed by calling `rs_free_rangeset()`.
///
pub unsafe extern "C" fn rs_intersection(
    set1: *const RangeSet,
    set2: *const RangeSet,
) -> *mut RangeSet {
    let res = unsafe { &*set1 }.intersection(unsafe { &*set2 });
    Box::into_raw(Box::new(res))
}

#[no_mangle]
/// Compute the difference of two range sets
///
/// `rs_difference()` returns a new range set containing members that are in
/// `set1` but not in `set2`.
///
/// # Safety
///
/// `set1` and `set2` must be valid range sets returned by this library.
///
/// The resulting range set must be freed by calling `rs_free_rangeset()`.
///
pub unsafe extern "C" fn rs_difference(
    set1: *const RangeSet,
    set2: *const RangeSet,
) -> *mut RangeSet {
    let res = unsafe { &*set1 }.difference(unsafe { &*set2 });
    Box::into_raw(Box::new(res))
}

#[no_mangle]
/// Compute the symmetric difference of two range sets
///
/// `rs_symmetric_difference()` returns a new range set containing members that
/// are in either `set1` or `set2` but not in both.
///
/// # Safety
///
/// `set1` and `set2` must be valid range sets returned by this library.
///
/// The resulting range set must be freed by calling `rs_free_rangeset()`.
///
pub unsafe extern "C" fn rs_symmetric_difference(
    set1: *const RangeSet,
    set2: *const RangeSet,
) -> *mut RangeSet {
    let res = unsafe { &*set1 }.symmetric_difference(unsafe { &*set2 });
    Box::into_raw(Box::new(res))
}

#[no_mangle]
/// Check whether every member of `set1` is a member of `set2`
///
/// # Safety
///
/// `set1` and `set2` must be valid range sets returned by this library.
///
/// # Return value
///
/// Returns 1 if `set1` is a subset of `set2`, 0 otherwise.
///
pub unsafe extern "C" fn rs_subset(set1: *const RangeSet, set2: *const RangeSet) -> c_int {
    unsafe { &*set1 }.is_subset(unsafe { &*set2 }) as c_int
}

#[no_mangle]
/// Check whether two range sets have the same members
///
/// # Safety
///
/// `set1` and `set2` must be valid range sets returned by this library.
///
/// # Return value
///
/// Returns 1 if both sets are equal, 0 otherwise.
///
pub unsafe extern "C" fn rs_equal(set1: *const RangeSet, set2: *const RangeSet) -> c_int {
    (unsafe { &*set1 } == unsafe { &*set2 }) as c_int
}

/// An iterator over the members of a range set
pub struct RangeSetIter<'a> {
    iter: Box<dyn Iterator<Item = String> + 'a>,
    has_error: bool,
}

#[no_mangle]
/// Create an iterator over the members of a range set
///
/// `rs_iter()` returns a newly allocated iterator over the members of `set`,
/// in canonical order.
///
/// # Safety
///
/// The caller must free the iterator by calling `rs_free_iter()`. The range
/// set must not be freed until the iterator is freed.
///
pub unsafe extern "C" fn rs_iter(set: *const RangeSet) -> *mut RangeSetIter<'static> {
    // The caller keeps the set alive for as long as the iterator
    let set: &'static RangeSet = unsafe { &*set };

    Box::into_raw(Box::new(RangeSetIter {
        iter: Box::new(set.iter()),
        has_error: false,
    }))
}

#[no_mangle]
/// Get the next member from an iterator
///
/// `rs_iter_next()` returns the next member yielded by the iterator `iter`.
/// It returns NULL if it cannot provide more members, due to an error or to
/// the iterator being depleted. In case of error, `*error` is set to a newly
/// allocated string containing the error message unless NULL was passed.
///
/// `rs_iter_status()` should be called after `rs_iter_next()` returns NULL to
/// check whether the iterator ended due to an error.
///
/// # Safety
///
/// `iter` must be a valid iterator returned by `rs_iter()`.
///
/// The caller must free the returned member by calling `rs_free_member()`.
///
/// In case of error, the caller must free the error string by calling
/// `rs_free_error()`.
///
pub unsafe extern "C" fn rs_iter_next(
    iter: *mut RangeSetIter,
    error: *mut *mut c_char,
) -> *mut c_char {
    let c_iter = unsafe { &mut *iter };

    let res = c_iter
        .iter
        .next()
        .map(|member| CString::new(member).map(CString::into_raw))
        .transpose();

    match res {
        Ok(res) => res.unwrap_or(std::ptr::null_mut()),
        Err(e) => {
            c_iter.has_error = true;
            ffi_error(e, error);
            std::ptr::null_mut()
        }
    }
}

#[no_mangle]
/// Returns whether the iterator has encountered an error
///
/// `rs_iter_status()` returns -1 if the iterator has failed, 0 otherwise.
///
/// # Safety
///
/// `iter` must be a valid iterator returned by `rs_iter()`.
///
pub unsafe extern "C" fn rs_iter_status(iter: *const RangeSetIter) -> c_int {
    if unsafe { &*iter }.has_error {
        -1
    } else {
        0
    }
}

unsafe fn ffi_error(rust_error: impl std::fmt::Display, c_error: *mut *mut c_char) {
    if !c_error.is_null() {
        let message = CString::new(rust_error.to_string())
            .or_else(|_| CString::new(DEFAULT_ERROR))
            .unwrap_or_default();
        unsafe {
            *c_error = message.into_raw();
        }
    }
}

#[no_mangle]
/// Free a range set returned by this library
///
/// # Safety
///
/// `set` must be a valid range set returned by this library.
///
pub unsafe extern "C" fn rs_free_rangeset(set: *mut RangeSet) {
    unsafe {
        let _ = Box::from_raw(set);
    };
}

#[no_mangle]
/// Free a member array returned by `rs_list()`
///
/// # Safety
///
/// Both `members` and `len` must be provided as returned by `rs_list()` and
/// their content must not have been modified
///
pub unsafe extern "C" fn rs_free_member_list(members: *mut *mut c_char, len: usize) {
    for member in Vec::from_raw_parts(members, len, len) {
        unsafe {
            let _ = CString::from_raw(member);
        };
    }
}

#[no_mangle]
/// Free an error string returned by any function in this library
///
/// # Safety
///
/// `error` must be provided as returned by a function of this library and its
/// content must not have been modified
///
pub unsafe extern "C" fn rs_free_error(error: *mut c_char) {
    unsafe {
        if !error.is_null() {
            let _ = CString::from_raw(error);
        }
    };
}

#[no_mangle]
/// Free a string returned by `rs_fold()` or `rs_iter_next()`
///
/// # Safety
///
/// `member` must be provided as returned by a function of this library and its
/// content must not have been modified
///
pub unsafe extern "C" fn rs_free_member(member: *mut c_char) {
    unsafe {
        let _ = CString::from_raw(member);
    };
}

#[no_mangle]
/// Free an iterator returned by `rs_iter()`
///
/// # Safety
///
/// `iter` must be provided as returned by `rs_iter()` and its content must not
/// have been modified
///
pub unsafe extern "C" fn rs_free_iter(iter: *mut RangeSetIter<'static>) {
    unsafe {
        let _ = Box::from_raw(iter);
    };
}
