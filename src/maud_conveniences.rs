use maud::{Markup, Render, html};

pub fn supertitle(s: impl Render) -> Markup {
    html! {
        h1 class="text-3xl font-bold text-gray-900 mb-2" {(s)}
    }
}

pub fn title(s: impl Render) -> Markup {
    html! {
        h2 class="text-xl font-semibold text-gray-900 mb-4" {(s)}
    }
}

pub fn errors_list(
    heading: Option<&str>,
    errors: impl IntoIterator<Item = impl Render>,
) -> Markup {
    html! {
        div role="alert" class="mb-6 p-4 bg-red-50 border border-red-200 rounded-lg text-red-700" {
            @if let Some(heading) = heading {
                strong class="font-bold" {(heading)}
            }
            ul class="list-disc list-inside" {
                @for error in errors {
                    li {(error)}
                }
            }
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub enum BannerKind {
    Success,
    Failure,
}

pub fn banner(kind: BannerKind, message: impl Render) -> Markup {
    let class = match kind {
        BannerKind::Success => "mb-6 p-4 bg-green-50 border border-green-200 rounded-lg text-green-700",
        BannerKind::Failure => "mb-6 p-4 bg-red-50 border border-red-200 rounded-lg text-red-700",
    };

    html! {
        div role="alert" class=(class) {
            span {(message)}
        }
    }
}

pub fn form_element(id: &str, display_name: &str, input: Markup) -> Markup {
    html! {
        div class="mb-4" {
            label for=(id) class="block text-sm font-medium text-gray-700 mb-2" {(display_name)}
            (input)
        }
    }
}

const INPUT_CLASS: &str = "w-full px-4 py-2 border border-gray-300 rounded-lg focus:ring-2 focus:ring-blue-500 focus:border-transparent";

pub fn simple_form_element(
    id: &str,
    display_name: &str,
    required: bool,
    ty: Option<&str>,
    value: Option<&str>,
    pattern: Option<&str>,
) -> Markup {
    form_element(
        id,
        display_name,
        html! {
            input type=(ty.unwrap_or("text")) name=(id) id=(id) required[required] value=[value] pattern=[pattern] class=(INPUT_CLASS);
        },
    )
}

pub fn select_element(
    id: &str,
    display_name: &str,
    required: bool,
    placeholder: &str,
    options: &[&str],
    selected: &str,
) -> Markup {
    form_element(
        id,
        display_name,
        html! {
            select id=(id) name=(id) required[required] class=(INPUT_CLASS) {
                option value="" {(placeholder)}
                @for option in options {
                    @let is_selected = *option == selected;
                    option value=(option) selected[is_selected] {(option)}
                }
            }
        },
    )
}

pub fn form_submit_button(text: Option<&str>) -> Markup {
    html! {
        div class="flex items-center justify-between" {
            button type="submit" class="w-full bg-blue-800 hover:bg-blue-900 text-white font-bold py-3 px-4 rounded-lg focus:outline-none" {
                (text.unwrap_or("Submit"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_attributes_only_render_when_set() {
        let with = simple_form_element("mobile", "Mobile", true, Some("tel"), Some("98"), Some("[0-9]{10}")).into_string();
        assert!(with.contains("required"));
        assert!(with.contains(r#"pattern="[0-9]{10}""#));
        assert!(with.contains(r#"value="98""#));

        let without = simple_form_element("exam", "Exam", false, None, None, None).into_string();
        assert!(!without.contains("required"));
        assert!(!without.contains("pattern"));
        assert!(!without.contains("value="));
    }

    #[test]
    fn select_marks_the_chosen_option() {
        let markup = select_element("medium", "Medium", true, "Select Medium", &["CBSE", "UP Board"], "UP Board").into_string();
        assert!(markup.contains(r#"<option value="UP Board" selected>"#));
        assert!(!markup.contains(r#"<option value="CBSE" selected>"#));
    }

    #[test]
    fn values_are_escaped() {
        let markup = banner(BannerKind::Failure, "<script>").into_string();
        assert!(markup.contains("&lt;script&gt;"));
    }
}
