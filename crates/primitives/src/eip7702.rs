//! EIP-7702 delegate-account init code utilities
//!
//! Delegate-based accounts mark their init code with a two-byte prefix
//! instead of the factory-address convention. The layout helpers here are
//! strict: a malformed delegate or a missing marker is a validation error,
//! raised before any I/O.

use ethers::types::Bytes;
use thiserror::Error;

/// Two-byte marker distinguishing EIP-7702 init code from the factory form
pub const EIP7702_MARKER: [u8; 2] = [0x77, 0x02];

/// Length of the delegate address embedded after the marker
const DELEGATE_LENGTH: usize = 20;

/// EIP-7702 init code validation errors
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Eip7702Error {
    /// The delegate is not a 20-byte address
    #[error("delegate address must be 20 bytes, got {0}")]
    InvalidDelegateLength(usize),

    /// The init code does not carry the EIP-7702 marker
    #[error("init code does not start with the EIP-7702 marker")]
    MissingMarker,
}

/// Whether the init code is in the EIP-7702 marker form
pub fn is_eip7702_user_op(init_code: &[u8]) -> bool {
    init_code.len() >= EIP7702_MARKER.len() && init_code[0..2] == EIP7702_MARKER
}

/// The 20-byte delegate address embedded in EIP-7702 init code, or empty
/// bytes when the marker (or the full delegate) is absent
pub fn get_eip7702_delegate(init_code: &[u8]) -> Bytes {
    if is_eip7702_user_op(init_code) && init_code.len() >= 2 + DELEGATE_LENGTH {
        Bytes::from(init_code[2..2 + DELEGATE_LENGTH].to_vec())
    } else {
        Bytes::default()
    }
}

/// Builds EIP-7702 init code: `marker(2)‖delegate(20)‖extraData?`
pub fn create_eip7702_init_code(
    delegate: &[u8],
    extra_data: Option<&[u8]>,
) -> Result<Bytes, Eip7702Error> {
    if delegate.len() != DELEGATE_LENGTH {
        return Err(Eip7702Error::InvalidDelegateLength(delegate.len()));
    }
    let mut out =
        Vec::with_capacity(2 + DELEGATE_LENGTH + extra_data.map_or(0, <[u8]>::len));
    out.extend_from_slice(&EIP7702_MARKER);
    out.extend_from_slice(delegate);
    if let Some(extra) = extra_data {
        out.extend_from_slice(extra);
    }
    Ok(out.into())
}

/// Rewrites EIP-7702 init code for hashing: the account's deployed delegate
/// can differ at signing time vs. mining time, and the digest must commit to
/// the authoritative delegate, not the raw bytes. A payload shorter than a
/// full delegate collapses to the bare delegate address; otherwise the
/// embedded delegate is replaced and the remainder preserved.
pub fn update_init_code_for_hashing(
    init_code: &[u8],
    delegate: &[u8],
) -> Result<Bytes, Eip7702Error> {
    if !is_eip7702_user_op(init_code) {
        return Err(Eip7702Error::MissingMarker);
    }
    if delegate.len() != DELEGATE_LENGTH {
        return Err(Eip7702Error::InvalidDelegateLength(delegate.len()));
    }

    let payload = &init_code[2..];
    if payload.len() < DELEGATE_LENGTH {
        return Ok(Bytes::from(delegate.to_vec()));
    }

    let mut out = Vec::with_capacity(init_code.len());
    out.extend_from_slice(&EIP7702_MARKER);
    out.extend_from_slice(delegate);
    out.extend_from_slice(&payload[DELEGATE_LENGTH..]);
    Ok(out.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::Address;

    fn delegate() -> Address {
        "0x9c5754De1443984659E1b3a8d1931D83475ba29C".parse().unwrap()
    }

    #[test]
    fn marker_detection() {
        let init_code = create_eip7702_init_code(delegate().as_bytes(), None).unwrap();
        assert!(is_eip7702_user_op(&init_code));
        assert!(!is_eip7702_user_op(&[]));
        assert!(!is_eip7702_user_op(&[0x77]));
        assert!(!is_eip7702_user_op(delegate().as_bytes()));
    }

    #[test]
    fn created_init_code_layout() {
        let extra: &[u8] = &[0xde, 0xad];
        let init_code =
            create_eip7702_init_code(delegate().as_bytes(), Some(extra)).unwrap();
        assert_eq!(init_code.len(), 2 + 20 + 2);
        assert_eq!(&init_code[0..2], EIP7702_MARKER);
        assert_eq!(get_eip7702_delegate(&init_code), Bytes::from(delegate().as_bytes().to_vec()));
        assert_eq!(&init_code[22..], extra);
    }

    #[test]
    fn delegate_extraction_requires_marker_and_length() {
        assert!(get_eip7702_delegate(delegate().as_bytes()).is_empty());
        assert!(get_eip7702_delegate(&[0x77, 0x02, 0x01]).is_empty());
    }

    #[test]
    fn create_rejects_bad_delegate() {
        let err = create_eip7702_init_code(&[0u8; 19], None).unwrap_err();
        assert_eq!(err, Eip7702Error::InvalidDelegateLength(19));
        assert_eq!(err.to_string(), "delegate address must be 20 bytes, got 19");
    }

    #[test]
    fn update_replaces_delegate_and_preserves_remainder() {
        let old: Address = "0x95222290DD7278Aa3Ddd389Cc1E1d165CC4BAfe5".parse().unwrap();
        let init_code =
            create_eip7702_init_code(old.as_bytes(), Some(&[0x01, 0x02])).unwrap();

        let updated = update_init_code_for_hashing(&init_code, delegate().as_bytes()).unwrap();
        assert_eq!(&updated[0..2], EIP7702_MARKER);
        assert_eq!(&updated[2..22], delegate().as_bytes());
        assert_eq!(&updated[22..], &[0x01, 0x02]);
    }

    #[test]
    fn update_with_short_payload_yields_bare_delegate() {
        let init_code: &[u8] = &[0x77, 0x02, 0xaa, 0xbb];
        let updated = update_init_code_for_hashing(init_code, delegate().as_bytes()).unwrap();
        assert_eq!(updated, Bytes::from(delegate().as_bytes().to_vec()));
    }

    #[test]
    fn update_requires_marker_and_delegate_length() {
        assert_eq!(
            update_init_code_for_hashing(delegate().as_bytes(), delegate().as_bytes()),
            Err(Eip7702Error::MissingMarker)
        );
        let init_code = create_eip7702_init_code(delegate().as_bytes(), None).unwrap();
        assert_eq!(
            update_init_code_for_hashing(&init_code, &[0u8; 21]),
            Err(Eip7702Error::InvalidDelegateLength(21))
        );
    }
}
