use crate::error::{MantraError, MantraResult, WritePhotoSnafu};
use jiff::Timestamp;
use rand::{Rng, rng};
use snafu::ResultExt;
use std::path::{Path, PathBuf};
use tokio::{fs::OpenOptions, io::AsyncWriteExt};

///an uploaded photo as read off the wire. `bytes` holds at most the configured
///maximum, `size` is the full length the client sent
#[derive(Debug, Clone, Default)]
pub struct PhotoUpload {
    pub original_file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    pub size: usize,
}

impl PhotoUpload {
    ///browsers send an empty, nameless file part when nothing was chosen
    pub fn is_empty(&self) -> bool {
        self.size == 0
            && self
                .original_file_name
                .as_deref()
                .is_none_or(|name| name.trim().is_empty())
    }

    ///stores at most `max_bytes`, while still counting everything
    pub fn push_chunk(&mut self, chunk: &[u8], max_bytes: usize) {
        self.size += chunk.len();
        let room = max_bytes.saturating_sub(self.bytes.len());
        self.bytes.extend_from_slice(&chunk[..chunk.len().min(room)]);
    }

    ///declared type wins, sniffed from the magic bytes if the part had none
    pub fn mime_type(&self) -> Option<String> {
        self.content_type
            .clone()
            .or_else(|| infer::get(&self.bytes).map(|kind| kind.mime_type().to_string()))
    }

    fn check_is_image(&self) -> MantraResult<()> {
        let mime_type = self.mime_type();
        if mime_type.as_deref().is_some_and(|mt| mt.starts_with("image/")) {
            Ok(())
        } else {
            Err(MantraError::PhotoNotAnImage {
                content_type: mime_type,
            })
        }
    }

    pub fn check(&self, max_bytes: usize) -> MantraResult<()> {
        self.check_is_image()?;

        if self.size > max_bytes {
            return Err(MantraError::PhotoTooLarge {
                size: self.size,
                max: max_bytes,
            });
        }

        Ok(())
    }

    ///the request body limit stopped this upload part-way, so whatever was counted it is
    ///over `max_bytes`. The type check still comes first.
    pub fn cut_off_error(&self, max_bytes: usize) -> MantraError {
        match self.check_is_image() {
            Err(not_an_image) => not_an_image,
            Ok(()) => MantraError::PhotoTooLarge {
                size: self.size.max(max_bytes.saturating_add(1)),
                max: max_bytes,
            },
        }
    }

    pub fn extension(&self) -> Option<String> {
        let ext = Path::new(self.original_file_name.as_deref()?)
            .extension()?
            .to_str()?;

        if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    ///`photo-<unix millis>-<random>.<ext>`
    pub fn generate_file_name(&self) -> String {
        let millis = Timestamp::now().as_millisecond();
        let suffix = rng().random_range(0..1_000_000_000_u32);

        match self.extension() {
            Some(ext) => format!("photo-{millis}-{suffix}.{ext}"),
            None => format!("photo-{millis}-{suffix}"),
        }
    }

    ///never overwrites - a name collision is reported as a write error
    pub async fn save(&self, directory: &Path, file_name: &str) -> MantraResult<PathBuf> {
        let path = directory.join(file_name);

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .context(WritePhotoSnafu { path: &path })?;
        file.write_all(&self.bytes)
            .await
            .context(WritePhotoSnafu { path: &path })?;
        file.flush().await.context(WritePhotoSnafu { path: &path })?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    fn upload(name: &str, content_type: Option<&str>, bytes: &[u8]) -> PhotoUpload {
        let mut upload = PhotoUpload {
            original_file_name: Some(name.into()),
            content_type: content_type.map(Into::into),
            ..PhotoUpload::default()
        };
        upload.push_chunk(bytes, 64);
        upload
    }

    #[test]
    fn empty_nameless_parts_count_as_absent() {
        assert!(upload("", Some("application/octet-stream"), b"").is_empty());
        assert!(PhotoUpload::default().is_empty());
        assert!(!upload("me.png", Some("image/png"), b"").is_empty());
    }

    #[test]
    fn chunks_are_capped_but_counted() {
        let mut photo = PhotoUpload::default();
        photo.push_chunk(&[1; 40], 64);
        photo.push_chunk(&[2; 40], 64);

        assert_eq!(photo.size, 80);
        assert_eq!(photo.bytes.len(), 64);
    }

    #[test]
    fn images_within_the_limit_pass() {
        assert!(upload("me.png", Some("image/png"), PNG_MAGIC).check(64).is_ok());
        assert!(upload("me.jpg", Some("image/jpeg"), &[0; 64]).check(64).is_ok());
    }

    #[test]
    fn non_images_are_rejected_whatever_their_size() {
        for bytes in [&b"hello"[..], &[0; 64][..]] {
            let err = upload("notes.txt", Some("text/plain"), bytes).check(64).unwrap_err();
            assert!(matches!(err, MantraError::PhotoNotAnImage { .. }));
        }

        let mut huge = upload("notes.txt", Some("text/plain"), b"");
        huge.size = 1_000;
        assert!(matches!(huge.check(64).unwrap_err(), MantraError::PhotoNotAnImage { .. }));
    }

    #[test]
    fn oversized_images_get_the_size_error() {
        let mut photo = upload("me.png", Some("image/png"), &[0; 64]);
        photo.push_chunk(&[0; 1], 64);

        let err = photo.check(64).unwrap_err();
        assert!(matches!(err, MantraError::PhotoTooLarge { size: 65, max: 64 }));
    }

    #[test]
    fn cut_off_uploads_are_too_large_unless_not_images() {
        let partial = upload("me.jpg", Some("image/jpeg"), &[0; 8]);
        assert!(matches!(
            partial.cut_off_error(64),
            MantraError::PhotoTooLarge { size: 65, max: 64 }
        ));

        let text = upload("notes.txt", Some("text/plain"), &[0; 8]);
        assert!(matches!(text.cut_off_error(64), MantraError::PhotoNotAnImage { .. }));
    }

    #[test]
    fn missing_content_type_falls_back_to_sniffing() {
        assert_eq!(upload("me", None, PNG_MAGIC).mime_type().as_deref(), Some("image/png"));
        assert!(upload("me", None, b"plain words").check(64).is_err());
    }

    #[test]
    fn extensions_are_kept_only_when_safe() {
        assert_eq!(upload("Me.JPG", None, b"").extension().as_deref(), Some("jpg"));
        assert_eq!(upload("../../etc/x.png", None, b"").extension().as_deref(), Some("png"));
        assert_eq!(upload("noext", None, b"").extension(), None);
        assert_eq!(upload("weird.p/ng", None, b"").extension(), None);
        assert_eq!(upload("odd.pn g", None, b"").extension(), None);
    }

    #[test]
    fn generated_names_keep_the_extension_and_differ() {
        let photo = upload("me.png", Some("image/png"), PNG_MAGIC);
        let a = photo.generate_file_name();
        let b = photo.generate_file_name();

        assert!(a.starts_with("photo-"));
        assert!(a.ends_with(".png"));
        assert!(!a.contains('/'));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn save_writes_once_and_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let photo = upload("me.png", Some("image/png"), PNG_MAGIC);

        let path = photo.save(dir.path(), "photo-1-1.png").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), PNG_MAGIC);

        let err = photo.save(dir.path(), "photo-1-1.png").await.unwrap_err();
        assert!(matches!(err, MantraError::WritePhoto { .. }));
    }
}
