//! HTML for the single page. Kept as plain string building; the page has no
//! template logic beyond a handful of conditional blocks.

use crate::flow::{AvatarDisplay, Notice, RenderedView};

pub const TITLE: &str = "Face Match: Your Pixar-Style Avatar";

const STYLE: &str = r#"
body { font-family: sans-serif; max-width: 760px; margin: 2rem auto; padding: 0 1rem; color: #262730; }
figure { margin: 1rem 0; }
figure img { max-width: 100%; border-radius: 6px; }
figcaption { color: #808495; font-size: 0.9rem; }
.notice { padding: 0.75rem 1rem; border-radius: 6px; margin: 1rem 0; }
.notice.success { background: #dff5e3; color: #1b5e20; }
.notice.error { background: #fde7e9; color: #8a1c25; }
button { padding: 0.5rem 1.2rem; margin-top: 0.75rem; }
"#;

const PREVIEW_SCRIPT: &str = r#"
document.getElementById('image').addEventListener('change', function (event) {
  var file = event.target.files[0];
  var preview = document.getElementById('preview');
  if (!file) { preview.hidden = true; return; }
  preview.querySelector('img').src = URL.createObjectURL(file);
  preview.hidden = false;
});
"#;

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn render(view: &RenderedView, notice: Option<&Notice>) -> String {
    let mut html = String::new();

    html.push_str(&format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<h1>{title}</h1>\n",
        title = escape(TITLE),
    ));

    html.push_str(
        "<form action=\"/generate\" method=\"post\" enctype=\"multipart/form-data\">\n\
         <label for=\"image\">Upload your photo</label><br>\n\
         <input type=\"file\" id=\"image\" name=\"image\" accept=\".jpg,.jpeg,.png,image/jpeg,image/png\" required>\n\
         <figure id=\"preview\" hidden><img alt=\"Your Photo\"><figcaption>Your Photo</figcaption></figure>\n\
         <br><button type=\"submit\">Generate Pixar Avatar</button>\n</form>\n",
    );

    if let Some(notice) = notice {
        let class = if notice.is_error() { "error" } else { "success" };
        html.push_str(&format!(
            "<div class=\"notice {class}\">{}</div>\n",
            escape(notice.message())
        ));
    }

    if let Some(description) = &view.description {
        html.push_str(&format!(
            "<h3>Description</h3>\n<p>{}</p>\n",
            escape(description)
        ));
    }

    if let Some(translation) = &view.chinese_description {
        html.push_str(&format!(
            "<h3>Chinese Translation</h3>\n<p lang=\"zh\">{}</p>\n",
            escape(translation)
        ));
    }

    if let Some(avatar) = &view.avatar {
        html.push_str("<h3>Your Pixar Avatar</h3>\n");
        match avatar {
            AvatarDisplay::Image(image) => {
                html.push_str(&format!(
                    "<figure><img src=\"{}\" width=\"{}\" height=\"{}\" alt=\"Generated Pixar Avatar\">\
                     <figcaption>Generated Pixar Avatar</figcaption></figure>\n",
                    image.to_data_uri(),
                    image.width,
                    image.height
                ));
            }
            AvatarDisplay::Error(message) => {
                html.push_str(&format!(
                    "<div class=\"notice error\">{}</div>\n",
                    escape(message)
                ));
            }
        }
    }

    html.push_str(&format!(
        "<script>{PREVIEW_SCRIPT}</script>\n</body>\n</html>\n"
    ));
    html
}
