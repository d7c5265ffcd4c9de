use crate::{
    data::registration::{
        CLASSES, COMPETITIVE_EXAMS, FieldErrors, MEDIUMS, RegistrationSubmission, register_student,
    },
    error::MantraError,
    maud_conveniences::{
        BannerKind, banner, errors_list, form_element, form_submit_button, select_element,
        simple_form_element, supertitle, title,
    },
    state::MantraState,
};
use axum::extract::{Multipart, State};
use maud::{Markup, html};

pub async fn get_register_page(State(state): State<MantraState>) -> Markup {
    state.render(html! {
        div class="max-w-4xl w-full mx-auto px-4 py-8" {
            div class="text-center mb-8" {
                (supertitle("Student Registration"))
                p class="text-gray-600" {"Join Success Mantra Institute and start your journey to success"}
            }
            (registration_form(&RegistrationSubmission::default(), FieldErrors::empty(), None))
        }
    })
}

///htmx target: swaps the whole form, keeping what was typed when something is wrong
pub async fn post_register_form(State(state): State<MantraState>, mut multipart: Multipart) -> Markup {
    let max_photo_bytes = state.config().upload_config().max_photo_bytes();

    let submission = match RegistrationSubmission::from_multipart(&mut multipart, max_photo_bytes).await {
        Ok(x) => x,
        Err(MantraError::PhotoTooLarge { .. }) => {
            return registration_form(
                &RegistrationSubmission::default(),
                FieldErrors::PHOTO_TOO_LARGE,
                None,
            );
        }
        Err(MantraError::PhotoNotAnImage { .. }) => {
            return registration_form(
                &RegistrationSubmission::default(),
                FieldErrors::PHOTO_NOT_IMAGE,
                None,
            );
        }
        Err(e) => {
            warn!(?e, "Unable to read registration form");
            return registration_form(
                &RegistrationSubmission::default(),
                FieldErrors::empty(),
                Some(banner(BannerKind::Failure, "Registration failed. Please try again.")),
            );
        }
    };

    let errors = submission.field_errors(max_photo_bytes);
    if !errors.is_empty() {
        return registration_form(&submission, errors, None);
    }

    match register_student(&state, submission.clone()).await {
        Ok(_) => registration_form(
            &RegistrationSubmission::default(),
            FieldErrors::empty(),
            Some(banner(BannerKind::Success, "Registration successful! We'll contact you soon.")),
        ),
        Err(e) => {
            error!(?e, "Error registering student from form");
            registration_form(
                &submission,
                FieldErrors::empty(),
                Some(banner(BannerKind::Failure, e.to_string())),
            )
        }
    }
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}

fn registration_form(
    values: &RegistrationSubmission,
    errors: FieldErrors,
    outcome: Option<Markup>,
) -> Markup {
    html! {
        div id="registration_form" class="bg-white rounded-lg shadow-lg p-8" {
            @if let Some(outcome) = outcome {
                (outcome)
            }
            @if !errors.is_empty() {
                (errors_list(Some("Please fix the following:"), errors.as_nice_list()))
            }

            form hx-post="/register" hx-encoding="multipart/form-data" hx-target="#registration_form" hx-swap="outerHTML" class="space-y-6" {
                div {
                    (title("Personal Information"))
                    div class="grid md:grid-cols-2 gap-6" {
                        (simple_form_element("firstName", "First Name *", true, None, non_empty(&values.first_name), None))
                        (simple_form_element("lastName", "Last Name *", true, None, non_empty(&values.last_name), None))
                        (simple_form_element("aadhar", "Aadhar Number *", true, None, non_empty(&values.aadhar), Some("[0-9 ]*")))
                        (simple_form_element("fatherName", "Father's Name *", true, None, non_empty(&values.father_name), None))
                        (simple_form_element("mobile", "Mobile Number *", true, Some("tel"), non_empty(&values.mobile), Some("[0-9]{10}")))
                        (form_element("photo", "Photo (max 2MB)", html! {
                            input type="file" name="photo" id="photo" accept="image/*" class="block w-full text-sm text-gray-700";
                        }))
                    }
                    div class="mt-6" {
                        (form_element("address", "Address *", html! {
                            textarea id="address" name="address" rows="3" required class="w-full px-4 py-2 border border-gray-300 rounded-lg" {(values.address)}
                        }))
                    }
                }

                div {
                    (title("Academic Information"))
                    div class="grid md:grid-cols-3 gap-6" {
                        (select_element("medium", "Medium *", true, "Select Medium", &MEDIUMS, &values.medium))
                        (select_element("class", "Class *", true, "Select Class", &CLASSES, &values.class))
                        (select_element("competitiveExam", "Competitive Exam", false, "Select Exam (Optional)", &COMPETITIVE_EXAMS, &values.competitive_exam))
                    }
                }

                (form_submit_button(Some("Register Now")))
            }
        }
    }
}
