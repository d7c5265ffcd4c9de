use crate::state::MantraState;
use axum::extract::State;
use maud::{Markup, html};

pub async fn get_index_route(State(state): State<MantraState>) -> Markup {
    state.render(html! {
        div class="bg-white p-8 mt-16 rounded-lg shadow-lg max-w-2xl w-full text-center" {
            h1 class="text-3xl font-bold mb-4" {
                "Success Mantra Institute"
            }
            p class="text-gray-600 mb-8" {
                "Coaching for CBSE and UP Board students, and for competitive exams."
            }

            a href="/register" class="bg-blue-800 hover:bg-blue-900 text-white font-bold py-3 px-6 rounded-lg" {
                "Register Now"
            }
        }
    })
}
