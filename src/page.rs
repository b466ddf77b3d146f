//! Page layout wrapper

use maud::{DOCTYPE, Markup, PreEscaped, html};

/// Wraps a rendered document fragment in a complete HTML page.
///
/// # Arguments
///
/// * `title`: Page title text
/// * `stylesheets`: Stylesheet hrefs, already relative to the page
/// * `body`: Rendered HTML fragment, inserted unescaped
///
/// # Returns
///
/// Complete HTML document
pub fn page_wrapper(title: &str, stylesheets: &[String], body: &str) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                @for stylesheet in stylesheets {
                    link rel="stylesheet" href=(stylesheet);
                }
            }
            body {
                main class="doc" {
                    (PreEscaped(body))
                }
            }
        }
    }
}
