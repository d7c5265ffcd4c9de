use crate::{
    config::UploadConfig,
    data::{
        DataType,
        photo::PhotoUpload,
        student::{NewStudent, Student},
    },
    error::{
        CommitTransactionSnafu, MantraError, MantraResult, MultipartSnafu, RegisterStudentSnafu,
        RollbackTransactionSnafu,
    },
    state::MantraState,
};
use axum::{extract::Multipart, http::StatusCode};
use bitflags::bitflags;
use snafu::ResultExt;

pub const MEDIUMS: [&str; 2] = ["CBSE", "UP Board"];
pub const CLASSES: [&str; 12] = [
    "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12",
];
pub const COMPETITIVE_EXAMS: [&str; 13] = [
    "SSC CGL",
    "SSC CHSL",
    "SSC MTS",
    "IBPS PO",
    "IBPS Clerk",
    "SBI PO",
    "SBI Clerk",
    "NDA",
    "CDS",
    "AFCAT",
    "UPSC Prelims",
    "UPSC Mains",
    "State PSC",
];

///raw registration fields exactly as submitted, before any checks
#[derive(Debug, Clone, Default)]
pub struct RegistrationSubmission {
    pub first_name: String,
    pub last_name: String,
    pub aadhar: String,
    pub father_name: String,
    pub address: String,
    pub mobile: String,
    pub medium: String,
    pub class: String,
    pub competitive_exam: String,
    pub photo: Option<PhotoUpload>,
}

pub fn is_valid_aadhar(aadhar: &str) -> bool {
    let mut digits = 0;
    for c in aadhar.chars().filter(|c| !c.is_whitespace()) {
        if !c.is_ascii_digit() {
            return false;
        }
        digits += 1;
    }
    digits == 12
}

pub fn is_valid_mobile(mobile: &str) -> bool {
    mobile.len() == 10 && mobile.bytes().all(|b| b.is_ascii_digit())
}

bitflags! {
    ///every problem with a submission at once, for re-rendering the form
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct FieldErrors: u16 {
        const EMPTY_FIRST_NAME =  0b0000_0000_0000_0001;
        const EMPTY_LAST_NAME =   0b0000_0000_0000_0010;
        const EMPTY_AADHAR =      0b0000_0000_0000_0100;
        const EMPTY_FATHER_NAME = 0b0000_0000_0000_1000;
        const EMPTY_ADDRESS =     0b0000_0000_0001_0000;
        const EMPTY_MOBILE =      0b0000_0000_0010_0000;
        const EMPTY_MEDIUM =      0b0000_0000_0100_0000;
        const EMPTY_CLASS =       0b0000_0000_1000_0000;

        const BAD_AADHAR =        0b0000_0001_0000_0000;
        const BAD_MOBILE =        0b0000_0010_0000_0000;
        const PHOTO_NOT_IMAGE =   0b0000_0100_0000_0000;
        const PHOTO_TOO_LARGE =   0b0000_1000_0000_0000;
    }
}

impl FieldErrors {
    pub fn as_nice_list(&self) -> impl Iterator<Item = &'static str> {
        self.iter().filter_map(|x| match x {
            Self::EMPTY_FIRST_NAME => Some("First name is required"),
            Self::EMPTY_LAST_NAME => Some("Last name is required"),
            Self::EMPTY_AADHAR => Some("Aadhar number is required"),
            Self::EMPTY_FATHER_NAME => Some("Father's name is required"),
            Self::EMPTY_ADDRESS => Some("Address is required"),
            Self::EMPTY_MOBILE => Some("Mobile number is required"),
            Self::EMPTY_MEDIUM => Some("Please select medium"),
            Self::EMPTY_CLASS => Some("Please select class"),
            Self::BAD_AADHAR => Some("Aadhar must be 12 digits"),
            Self::BAD_MOBILE => Some("Mobile must be 10 digits"),
            Self::PHOTO_NOT_IMAGE => Some("Only image files are allowed"),
            Self::PHOTO_TOO_LARGE => Some("Photo size must be less than 2MB"),
            _ => None,
        })
    }
}

impl RegistrationSubmission {
    pub async fn from_multipart(multipart: &mut Multipart, max_photo_bytes: usize) -> MantraResult<Self> {
        let mut submission = Self::default();

        while let Some(mut field) = multipart.next_field().await.context(MultipartSnafu)? {
            let Some(name) = field.name().map(ToString::to_string) else {
                continue;
            };

            let slot = match name.as_str() {
                "firstName" => &mut submission.first_name,
                "lastName" => &mut submission.last_name,
                "aadhar" => &mut submission.aadhar,
                "fatherName" => &mut submission.father_name,
                "address" => &mut submission.address,
                "mobile" => &mut submission.mobile,
                "medium" => &mut submission.medium,
                "class" => &mut submission.class,
                "competitiveExam" => &mut submission.competitive_exam,
                "photo" => {
                    let mut photo = PhotoUpload {
                        original_file_name: field.file_name().map(ToString::to_string),
                        content_type: field.content_type().map(ToString::to_string),
                        ..PhotoUpload::default()
                    };
                    loop {
                        match field.chunk().await {
                            Ok(Some(chunk)) => photo.push_chunk(&chunk, max_photo_bytes),
                            Ok(None) => break,
                            //only a photo far over its own limit can run the whole body over
                            Err(source) if source.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                                return Err(photo.cut_off_error(max_photo_bytes));
                            }
                            Err(source) => return Err(MantraError::Multipart { source }),
                        }
                    }

                    submission.photo = (!photo.is_empty()).then_some(photo);
                    continue;
                }
                other => {
                    debug!(field = other, "Ignoring unknown registration field");
                    continue;
                }
            };
            *slot = field.text().await.context(MultipartSnafu)?;
        }

        Ok(submission)
    }

    fn required_fields(&self) -> [(&str, FieldErrors); 8] {
        [
            (self.first_name.as_str(), FieldErrors::EMPTY_FIRST_NAME),
            (self.last_name.as_str(), FieldErrors::EMPTY_LAST_NAME),
            (self.aadhar.as_str(), FieldErrors::EMPTY_AADHAR),
            (self.father_name.as_str(), FieldErrors::EMPTY_FATHER_NAME),
            (self.address.as_str(), FieldErrors::EMPTY_ADDRESS),
            (self.mobile.as_str(), FieldErrors::EMPTY_MOBILE),
            (self.medium.as_str(), FieldErrors::EMPTY_MEDIUM),
            (self.class.as_str(), FieldErrors::EMPTY_CLASS),
        ]
    }

    ///checks in order and stops at the first failure: required fields, aadhar, mobile, photo
    pub fn validate(self, max_photo_bytes: usize) -> MantraResult<(NewStudent, Option<PhotoUpload>)> {
        if self
            .required_fields()
            .iter()
            .any(|(value, _)| value.trim().is_empty())
        {
            return Err(MantraError::MissingRequiredFields);
        }
        if !is_valid_aadhar(&self.aadhar) {
            return Err(MantraError::InvalidAadhar);
        }
        if !is_valid_mobile(&self.mobile) {
            return Err(MantraError::InvalidMobile);
        }
        if let Some(photo) = &self.photo {
            photo.check(max_photo_bytes)?;
        }

        let Self {
            first_name,
            last_name,
            aadhar,
            father_name,
            address,
            mobile,
            medium,
            class,
            competitive_exam,
            photo,
        } = self;

        Ok((
            NewStudent {
                first_name,
                last_name,
                aadhar,
                father_name,
                address,
                mobile,
                photo_path: None,
                medium,
                class,
                competitive_exam: (!competitive_exam.is_empty()).then_some(competitive_exam),
            },
            photo,
        ))
    }

    ///same rules as [`Self::validate`], but reports everything instead of the first failure
    pub fn field_errors(&self, max_photo_bytes: usize) -> FieldErrors {
        let mut errors = FieldErrors::empty();

        for (value, flag) in self.required_fields() {
            if value.trim().is_empty() {
                errors |= flag;
            }
        }
        if !errors.contains(FieldErrors::EMPTY_AADHAR) && !is_valid_aadhar(&self.aadhar) {
            errors |= FieldErrors::BAD_AADHAR;
        }
        if !errors.contains(FieldErrors::EMPTY_MOBILE) && !is_valid_mobile(&self.mobile) {
            errors |= FieldErrors::BAD_MOBILE;
        }
        if let Some(photo) = &self.photo {
            match photo.check(max_photo_bytes) {
                Err(MantraError::PhotoNotAnImage { .. }) => errors |= FieldErrors::PHOTO_NOT_IMAGE,
                Err(MantraError::PhotoTooLarge { .. }) => errors |= FieldErrors::PHOTO_TOO_LARGE,
                _ => {}
            }
        }

        errors
    }
}

///validates, then writes the row and the photo. The insert and the file write share one
///transaction: a failed write rolls the row back, and a failed commit removes the file.
pub async fn register_student(
    state: &MantraState,
    submission: RegistrationSubmission,
) -> MantraResult<i64> {
    let upload_config = state.config().upload_config();
    let (new_student, photo) = submission.validate(upload_config.max_photo_bytes())?;

    store_student(state, &upload_config, new_student, photo)
        .await
        .context(RegisterStudentSnafu)
}

async fn store_student(
    state: &MantraState,
    upload_config: &UploadConfig,
    mut new_student: NewStudent,
    photo: Option<PhotoUpload>,
) -> MantraResult<i64> {
    let photo = photo.map(|photo| (photo.generate_file_name(), photo));
    new_student.photo_path = photo.as_ref().map(|(file_name, _)| file_name.clone());

    let mut transaction = state.get_transaction().await?;
    let id = Student::insert_into_database(new_student, &mut transaction).await?;

    let Some((file_name, photo)) = photo else {
        transaction.commit().await.context(CommitTransactionSnafu)?;
        info!(id, "Registered student");
        return Ok(id);
    };

    let path = match photo.save(upload_config.directory(), &file_name).await {
        Ok(path) => path,
        Err(e) => {
            error!(?e, "Error saving photo, rolling back");
            transaction.rollback().await.context(RollbackTransactionSnafu)?;
            return Err(e);
        }
    };

    if let Err(e) = transaction.commit().await.context(CommitTransactionSnafu) {
        if let Err(remove_error) = tokio::fs::remove_file(&path).await {
            warn!(?remove_error, ?path, "Unable to remove photo after failed commit");
        }
        return Err(e);
    }

    info!(id, photo = %file_name, "Registered student");
    Ok(id)
}
