use chrono::NaiveDate;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub num_of_adults: u32,
    pub num_of_children: u32,
}

/// Envelope every backend endpoint answers with.
///
/// Only the auth-related fields are typed; users, rooms, bookings and their
/// lists stay as raw JSON in `data`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_confirmation_code: Option<String>,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl ApiResponse {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }
}

#[derive(Debug, Clone)]
enum FormValue {
    Text(String),
    File {
        file_name: String,
        mime: String,
        bytes: Vec<u8>,
    },
}

/// Multipart payload for room create/update, assembled by the caller.
///
/// The backend reads `roomType`, `roomPrice`, `roomDescription` and a
/// `photo` file, but any field set is sent as given.
#[derive(Debug, Clone, Default)]
pub struct RoomForm {
    fields: Vec<(String, FormValue)>,
}

impl RoomForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), FormValue::Text(value.into())));
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.fields.push((
            name.into(),
            FormValue::File {
                file_name: file_name.into(),
                mime: mime.into(),
                bytes,
            },
        ));
        self
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_multipart(self) -> Result<Form, ApiError> {
        let mut form = Form::new();
        for (name, value) in self.fields {
            form = match value {
                FormValue::Text(text) => form.text(name, text),
                FormValue::File {
                    file_name,
                    mime,
                    bytes,
                } => {
                    let part = Part::bytes(bytes)
                        .file_name(file_name)
                        .mime_str(&mime)
                        .map_err(|_| ApiError::InvalidForm(format!("{}: bad MIME type '{}'", name, mime)))?;
                    form.part(name, part)
                }
            };
        }
        Ok(form)
    }
}
