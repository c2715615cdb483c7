//! Image uploads (`/upload`), sent as `multipart/form-data`

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Id;
use crate::envelope::{Ack, Envelope, decode_ack};
use crate::errors::{ApiError, ApiResult};
use crate::mutation::MutationEndpoint;
use crate::tags::TagType;
use crate::transport::{ApiRequest, FormPart};

pub const UPLOAD_PATH: &str = "/upload";

/// A file to upload
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadFile {
    pub file_name: String,
    pub mime: Option<String>,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadFile")
            .field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime = guess_image_mime(&file_name).map(str::to_string);
        Self {
            file_name,
            mime,
            bytes,
        }
    }

    fn part(&self, field: &str) -> FormPart {
        FormPart::file(field, &self.file_name, self.mime.clone(), self.bytes.clone())
    }
}

fn guess_image_mime(file_name: &str) -> Option<&'static str> {
    let extension = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

/// Where an uploaded file can be fetched from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub url: String,
    #[serde(default, alias = "publicId", alias = "filename")]
    pub public_id: Option<String>,
}

fn decode_uploaded(value: Value) -> ApiResult<Vec<UploadedFile>> {
    match value {
        Value::Array(items) => {
            let mut files = Vec::with_capacity(items.len());
            for item in items {
                files.extend(decode_uploaded(item)?);
            }
            Ok(files)
        }
        Value::String(url) => Ok(vec![UploadedFile {
            url,
            public_id: None,
        }]),
        Value::Object(mut map) => {
            if map.contains_key("url") {
                return Ok(vec![serde_json::from_value(Value::Object(map))?]);
            }
            for key in ["files", "images", "urls"] {
                if let Some(list) = map.remove(key) {
                    return decode_uploaded(list);
                }
            }
            Err(ApiError::Parsing("upload response carries no file urls".to_string()))
        }
        other => Err(ApiError::Parsing(format!("unexpected upload response: {other}"))),
    }
}

fn decode_single(body: Value) -> ApiResult<UploadedFile> {
    decode_uploaded(Envelope::parse(body)?.payload)?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::Parsing("upload response carries no file".to_string()))
}

fn decode_many(body: Value) -> ApiResult<Vec<UploadedFile>> {
    decode_uploaded(Envelope::parse(body)?.payload)
}

pub fn upload_image() -> MutationEndpoint<UploadFile, UploadedFile> {
    MutationEndpoint::new("uploadImage", |file: &UploadFile| {
        Ok(ApiRequest::post(format!("{UPLOAD_PATH}/single")).multipart(vec![file.part("image")]))
    })
    .decode_with(decode_single)
    .invalidates_tags(&[TagType::Upload])
}

pub fn upload_images() -> MutationEndpoint<Vec<UploadFile>, Vec<UploadedFile>> {
    MutationEndpoint::new("uploadImages", |files: &Vec<UploadFile>| {
        if files.is_empty() {
            return Err(ApiError::Parsing("no files selected".to_string()));
        }
        let parts = files.iter().map(|file| file.part("images")).collect();
        Ok(ApiRequest::post(format!("{UPLOAD_PATH}/multiple")).multipart(parts))
    })
    .decode_with(decode_many)
    .invalidates_tags(&[TagType::Upload])
}

/// Delete by public id
pub fn delete_upload() -> MutationEndpoint<Id, Ack> {
    MutationEndpoint::new("deleteUpload", |public_id: &Id| {
        Ok(ApiRequest::delete(format!("{UPLOAD_PATH}/{public_id}")))
    })
    .decode_with(decode_ack)
    .invalidates_tags(&[TagType::Upload])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::Mutation;
    use crate::transport::RequestBody;
    use serde_json::json;

    #[test]
    fn single_upload_is_multipart_with_guessed_mime() {
        let file = UploadFile::new("photo.JPG", vec![1, 2, 3]);
        let request = upload_image().request(&file).unwrap();
        let RequestBody::Multipart(parts) = request.body else {
            panic!("expected multipart body");
        };
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].name(), "image");
        assert!(matches!(
            &parts[0],
            FormPart::File { mime: Some(mime), .. } if mime == "image/jpeg"
        ));
    }

    #[test]
    fn empty_multi_upload_is_rejected_before_sending() {
        assert!(upload_images().request(&Vec::new()).is_err());
    }

    #[test]
    fn decodes_upload_response_shapes() {
        let single = upload_image()
            .decode(json!({ "success": true, "data": { "url": "https://cdn/x.png", "publicId": "x" } }))
            .unwrap();
        assert_eq!(single.public_id.as_deref(), Some("x"));

        let many = upload_images()
            .decode(json!({ "data": { "urls": ["https://cdn/a.png", "https://cdn/b.png"] } }))
            .unwrap();
        assert_eq!(many.len(), 2);
        assert_eq!(many[1].url, "https://cdn/b.png");
    }
}
