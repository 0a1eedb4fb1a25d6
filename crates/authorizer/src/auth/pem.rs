//! Certificate to PEM conversion.
//!
//! JWKS `x5c` entries carry DER certificates as single-line standard base64.
//! `jsonwebtoken` reads RSA public keys out of PEM text, so the entry is
//! re-wrapped at 64 columns between certificate armor lines.

const PEM_LINE_WIDTH: usize = 64;
const BEGIN_CERTIFICATE: &str = "-----BEGIN CERTIFICATE-----";
const END_CERTIFICATE: &str = "-----END CERTIFICATE-----";

/// Wrap a base64 certificate in PEM armor.
///
/// Whitespace inside `cert` is dropped before wrapping. The content is not
/// validated here; an unusable certificate surfaces when the verifier builds
/// its decoding key.
pub fn cert_to_pem(cert: &str) -> String {
    let body: Vec<char> = cert.chars().filter(|c| !c.is_whitespace()).collect();

    let mut pem = String::with_capacity(
        BEGIN_CERTIFICATE.len() + END_CERTIFICATE.len() + body.len() + body.len() / PEM_LINE_WIDTH + 3,
    );
    pem.push_str(BEGIN_CERTIFICATE);
    pem.push('\n');
    for line in body.chunks(PEM_LINE_WIDTH) {
        pem.extend(line);
        pem.push('\n');
    }
    pem.push_str(END_CERTIFICATE);
    pem.push('\n');
    pem
}
