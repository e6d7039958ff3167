//! `multipart/form-data` encoding for the avatar upload.
//!
//! Only the single-file form the avatar endpoint accepts is supported.

use uuid::Uuid;

/// Form field the server reads the image from.
pub const IMAGE_FIELD: &str = "image";

pub(crate) fn new_boundary() -> String {
    format!("taskboard-{}", Uuid::new_v4().simple())
}

pub(crate) fn content_type(boundary: &str) -> String {
    format!("multipart/form-data; boundary={boundary}")
}

/// Encode one file part followed by the closing delimiter.
pub(crate) fn encode_file(
    boundary: &str,
    field: &str,
    filename: &str,
    content_type: &str,
    data: &[u8],
) -> Vec<u8> {
    let head = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
         Content-Type: {content_type}\r\n\r\n"
    );
    let tail = format!("\r\n--{boundary}--\r\n");

    let mut body = Vec::with_capacity(head.len() + data.len() + tail.len());
    body.extend_from_slice(head.as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(tail.as_bytes());
    body
}
