//! Markdown documentation for declarations, shared by hover and completion.

use tracing::debug;
use url::Url;

use crate::engine::{Annotation, DocComment, ParamAnnotation, SeeAlsoAnnotation};

const WIKIPEDIA_HOST: &str = "wikipedia.org";
const USER_MANUAL_HOST: &str = "en.wikibooks.org";
const USER_MANUAL_PATH: &str = "/wiki/OpenSCAD_User_Manual";

/// Renders the signature block followed by the doc comment, if any.
///
/// ````text
/// ```scad
/// module plate(size, r = 2)
/// ```
///
/// Rounded plate.
///
/// **Parameters:**
///
/// - `size` *(positional)* `number | vector`: Outer dimensions
///
/// [See more on Wikipedia](https://en.wikipedia.org/wiki/Plate)
/// ````
pub fn render(signature: &str, doc: Option<&DocComment>) -> String {
    let mut sections = vec![format!("```scad\n{}\n```", signature)];

    let Some(doc) = doc else {
        return sections.remove(0);
    };

    if !doc.body.is_empty() {
        sections.push(doc.body.clone());
    }

    let mut parameters = Vec::new();
    let mut see_also = Vec::new();
    for annotation in &doc.annotations {
        match annotation {
            Annotation::Param(param) => parameters.push(render_param(param)),
            Annotation::SeeAlso(link) => see_also.push(render_see_also(link)),
        }
    }

    if !parameters.is_empty() {
        sections.push(format!("**Parameters:**\n\n{}", parameters.join("\n")));
    }
    sections.extend(see_also);

    sections.join("\n\n")
}

fn render_param(param: &ParamAnnotation) -> String {
    let mut line = format!("- `{}`", param.link);
    if let Some(passing) = param.passing {
        line.push_str(&format!(" *({})*", passing.label()));
    }
    if !param.type_tags.is_empty() {
        line.push_str(&format!(" `{}`", param.type_tags.join(" | ")));
    }
    if !param.description.is_empty() {
        line.push_str(": ");
        line.push_str(&param.description);
    }
    line
}

fn render_see_also(annotation: &SeeAlsoAnnotation) -> String {
    let link = annotation.link.as_str();
    let url = match Url::parse(link) {
        Ok(url) => url,
        Err(err) => {
            debug!("Malformed @see link {:?}: {}", link, err);
            return format!("See also: {}", link);
        }
    };

    match url.host_str() {
        Some(host) if host == WIKIPEDIA_HOST || host.ends_with(".wikipedia.org") => {
            format!("[See more on Wikipedia]({})", link)
        }
        Some(USER_MANUAL_HOST) if url.path().starts_with(USER_MANUAL_PATH) => {
            format!("[See more on the User Manual]({})", link)
        }
        Some(host) => format!("See also: [{}]({})", host, link),
        None => {
            debug!("@see link without host: {:?}", link);
            format!("See also: {}", link)
        }
    }
}
