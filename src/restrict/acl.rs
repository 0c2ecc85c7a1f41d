//! Windows ACL lockdown.
//!
//! Reads the object's owner and DACL, keeps only the principals that are the
//! owner, `LocalSystem` or `BUILTIN\Administrators`, and writes back a
//! protected DACL (no inheritance from the parent) holding one allow entry per
//! kept principal with a restricted access mask. The owner always gets an
//! entry, even if the original DACL had none for it.

use super::request::ObjectKind;
use super::strategy::PermissionLockdownStrategy;
use std::ffi::c_void;
use std::io;
use std::mem;
use std::os::windows::ffi::OsStrExt;
use std::path::Path;
use std::ptr;
use windows_sys::Win32::Foundation::{ERROR_SUCCESS, LocalFree};
use windows_sys::Win32::Security::Authorization::{
    GetNamedSecurityInfoW, SE_FILE_OBJECT, SetNamedSecurityInfoW,
};
use windows_sys::Win32::Security::{
    ACCESS_ALLOWED_ACE, ACE_HEADER, ACL, ACL_REVISION, ACL_SIZE_INFORMATION, AclSizeInformation,
    AddAccessAllowedAceEx, CONTAINER_INHERIT_ACE, CreateWellKnownSid, DACL_SECURITY_INFORMATION,
    GetAce, GetAclInformation, GetLengthSid, InitializeAcl, OBJECT_INHERIT_ACE,
    OWNER_SECURITY_INFORMATION, PROTECTED_DACL_SECURITY_INFORMATION, PSECURITY_DESCRIPTOR, PSID,
    WELL_KNOWN_SID_TYPE, WinBuiltinAdministratorsSid, WinLocalSystemSid,
};

// File access rights (winnt.h).
const FILE_READ_DATA: u32 = 0x0001;
const FILE_WRITE_DATA: u32 = 0x0002;
const FILE_APPEND_DATA: u32 = 0x0004;
const FILE_READ_EA: u32 = 0x0008;
const FILE_WRITE_EA: u32 = 0x0010;
const FILE_EXECUTE: u32 = 0x0020;
const FILE_DELETE_CHILD: u32 = 0x0040;
const FILE_READ_ATTRIBUTES: u32 = 0x0080;
const FILE_WRITE_ATTRIBUTES: u32 = 0x0100;
const DELETE: u32 = 0x0001_0000;
const READ_CONTROL: u32 = 0x0002_0000;
const WRITE_DAC: u32 = 0x0004_0000;
const WRITE_OWNER: u32 = 0x0008_0000;
const SYNCHRONIZE: u32 = 0x0010_0000;

const READ_MASK: u32 = FILE_READ_DATA
    | FILE_READ_EA
    | FILE_EXECUTE
    | FILE_READ_ATTRIBUTES
    | READ_CONTROL
    | SYNCHRONIZE;

const WRITE_MASK: u32 = FILE_WRITE_DATA
    | FILE_APPEND_DATA
    | FILE_WRITE_EA
    | FILE_DELETE_CHILD
    | FILE_WRITE_ATTRIBUTES
    | DELETE
    | WRITE_DAC
    | WRITE_OWNER;

// ACE types whose body is `{ header, mask, sid }`.
const ACCESS_ALLOWED_ACE_TYPE: u8 = 0;
const ACCESS_DENIED_ACE_TYPE: u8 = 1;

const SECURITY_MAX_SID_SIZE: usize = 68;

/// Owner-only permissions expressed as a rewritten DACL.
#[derive(Debug, Default, Clone, Copy)]
pub struct AclStrategy;

/// Access mask granted to every kept principal.
pub(super) fn access_mask(writable_by_owner: bool) -> u32 {
    if writable_by_owner {
        READ_MASK | WRITE_MASK
    } else {
        READ_MASK
    }
}

/// Inheritance flags for the rewritten entries.
pub(super) fn ace_flags(kind: ObjectKind) -> u32 {
    if kind.is_directory() {
        OBJECT_INHERIT_ACE | CONTAINER_INHERIT_ACE
    } else {
        0
    }
}

impl PermissionLockdownStrategy for AclStrategy {
    fn name(&self) -> &'static str {
        "acl"
    }

    fn lock_down(&self, path: &Path, kind: ObjectKind, writable_by_owner: bool) -> io::Result<()> {
        let mut wide: Vec<u16> = path
            .as_os_str()
            .encode_wide()
            .chain(std::iter::once(0))
            .collect();

        let descriptor = SecurityDescriptor::read(&mut wide)?;
        let allowed = [
            well_known_sid(WinLocalSystemSid)?,
            well_known_sid(WinBuiltinAdministratorsSid)?,
        ];

        // SAFETY: owner points into the descriptor, which outlives this call.
        let owner = unsafe { copy_sid(descriptor.owner) };
        let mut kept: Vec<Vec<u8>> = vec![owner];
        for sid in descriptor.entry_sids()? {
            if !kept.contains(&sid) && allowed.contains(&sid) {
                kept.push(sid);
            }
        }

        let mut acl = build_acl(&kept, access_mask(writable_by_owner), ace_flags(kind))?;

        // SAFETY: wide is NUL-terminated, acl is an initialized ACL buffer.
        let status = unsafe {
            SetNamedSecurityInfoW(
                wide.as_mut_ptr(),
                SE_FILE_OBJECT,
                DACL_SECURITY_INFORMATION | PROTECTED_DACL_SECURITY_INFORMATION,
                ptr::null_mut(),
                ptr::null_mut(),
                acl.as_mut_ptr().cast::<ACL>(),
                ptr::null(),
            )
        };
        if status != ERROR_SUCCESS {
            return Err(io::Error::from_raw_os_error(status as i32));
        }

        Ok(())
    }
}

/// Owner and DACL of one object, freed with `LocalFree` on drop.
struct SecurityDescriptor {
    raw: PSECURITY_DESCRIPTOR,
    owner: PSID,
    dacl: *mut ACL,
}

impl SecurityDescriptor {
    fn read(wide_path: &mut [u16]) -> io::Result<Self> {
        let mut raw: PSECURITY_DESCRIPTOR = ptr::null_mut();
        let mut owner: PSID = ptr::null_mut();
        let mut dacl: *mut ACL = ptr::null_mut();

        // SAFETY: all out-pointers are valid; the path is NUL-terminated.
        let status = unsafe {
            GetNamedSecurityInfoW(
                wide_path.as_mut_ptr(),
                SE_FILE_OBJECT,
                OWNER_SECURITY_INFORMATION | DACL_SECURITY_INFORMATION,
                &mut owner,
                ptr::null_mut(),
                &mut dacl,
                ptr::null_mut(),
                &mut raw,
            )
        };
        if status != ERROR_SUCCESS {
            return Err(io::Error::from_raw_os_error(status as i32));
        }

        Ok(Self { raw, owner, dacl })
    }

    /// SIDs of the allow/deny entries of the DACL. A NULL DACL has none.
    fn entry_sids(&self) -> io::Result<Vec<Vec<u8>>> {
        if self.dacl.is_null() {
            return Ok(Vec::new());
        }

        let mut info: ACL_SIZE_INFORMATION = unsafe { mem::zeroed() };
        // SAFETY: dacl is a valid ACL owned by the descriptor.
        let ok = unsafe {
            GetAclInformation(
                self.dacl,
                (&mut info as *mut ACL_SIZE_INFORMATION).cast::<c_void>(),
                mem::size_of::<ACL_SIZE_INFORMATION>() as u32,
                AclSizeInformation,
            )
        };
        if ok == 0 {
            return Err(io::Error::last_os_error());
        }

        let mut sids = Vec::with_capacity(info.AceCount as usize);
        for index in 0..info.AceCount {
            let mut ace: *mut c_void = ptr::null_mut();
            // SAFETY: index < AceCount.
            if unsafe { GetAce(self.dacl, index, &mut ace) } == 0 {
                return Err(io::Error::last_os_error());
            }

            // SAFETY: every ACE starts with an ACE_HEADER.
            let header = unsafe { &*ace.cast::<ACE_HEADER>() };
            if header.AceType != ACCESS_ALLOWED_ACE_TYPE && header.AceType != ACCESS_DENIED_ACE_TYPE
            {
                continue;
            }

            // SAFETY: allow and deny ACEs share the ACCESS_ALLOWED_ACE layout.
            let body = ace.cast::<ACCESS_ALLOWED_ACE>();
            let sid = unsafe { ptr::addr_of_mut!((*body).SidStart) }.cast::<c_void>();
            sids.push(unsafe { copy_sid(sid) });
        }

        Ok(sids)
    }
}

impl Drop for SecurityDescriptor {
    fn drop(&mut self) {
        if !self.raw.is_null() {
            // SAFETY: raw was allocated by GetNamedSecurityInfoW.
            unsafe {
                LocalFree(self.raw);
            }
        }
    }
}

/// Copy the bytes of a SID so it can outlive its descriptor.
///
/// # Safety
///
/// `sid` must point to a valid SID.
unsafe fn copy_sid(sid: PSID) -> Vec<u8> {
    let len = unsafe { GetLengthSid(sid) } as usize;
    unsafe { std::slice::from_raw_parts(sid.cast::<u8>(), len) }.to_vec()
}

fn well_known_sid(kind: WELL_KNOWN_SID_TYPE) -> io::Result<Vec<u8>> {
    // u32 storage keeps the SID DWORD-aligned.
    let mut buf = [0u32; SECURITY_MAX_SID_SIZE / 4];
    let mut size = SECURITY_MAX_SID_SIZE as u32;

    // SAFETY: buf holds SECURITY_MAX_SID_SIZE bytes.
    let ok = unsafe {
        CreateWellKnownSid(
            kind,
            ptr::null_mut(),
            buf.as_mut_ptr().cast::<c_void>(),
            &mut size,
        )
    };
    if ok == 0 {
        return Err(io::Error::last_os_error());
    }

    // SAFETY: CreateWellKnownSid wrote `size` bytes.
    Ok(unsafe { std::slice::from_raw_parts(buf.as_ptr().cast::<u8>(), size as usize) }.to_vec())
}

/// Build a DACL with one allow entry per SID. Returned as DWORD storage so the
/// ACL is correctly aligned.
fn build_acl(sids: &[Vec<u8>], mask: u32, flags: u32) -> io::Result<Vec<u32>> {
    let ace_base = mem::size_of::<ACCESS_ALLOWED_ACE>() - mem::size_of::<u32>();
    let size = mem::size_of::<ACL>() + sids.iter().map(|s| ace_base + s.len()).sum::<usize>();
    let size = (size + 3) & !3;

    let mut buf = vec![0u32; size / 4];
    let acl = buf.as_mut_ptr().cast::<ACL>();

    // SAFETY: buf is `size` bytes and DWORD-aligned.
    if unsafe { InitializeAcl(acl, size as u32, ACL_REVISION) } == 0 {
        return Err(io::Error::last_os_error());
    }

    for sid in sids {
        let mut sid = sid.clone();
        // SAFETY: sid holds a complete SID copied from the system.
        let ok = unsafe {
            AddAccessAllowedAceEx(
                acl,
                ACL_REVISION,
                flags,
                mask,
                sid.as_mut_ptr().cast::<c_void>(),
            )
        };
        if ok == 0 {
            return Err(io::Error::last_os_error());
        }
    }

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_only_mask_has_no_write_bits() {
        assert_eq!(access_mask(false) & WRITE_MASK, 0);
        assert_eq!(access_mask(true) & WRITE_MASK, WRITE_MASK);
        assert_eq!(access_mask(true) & READ_MASK, READ_MASK);
    }

    #[test]
    fn only_directories_inherit() {
        assert_eq!(ace_flags(ObjectKind::File), 0);
        assert_ne!(ace_flags(ObjectKind::Directory), 0);
    }

    #[test]
    fn well_known_sids_differ() {
        let system = well_known_sid(WinLocalSystemSid).unwrap();
        let admins = well_known_sid(WinBuiltinAdministratorsSid).unwrap();
        assert_ne!(system, admins);
    }
}
