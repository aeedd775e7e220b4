//! Content-kind specific wrapping of an inserted marker.

use crate::domain::{ContentKind, Document, Namespace};

/// Wrap `code` so that it is inert in `doc`'s content model.
///
/// - Template namespace (or `noinclude` requested): `<noinclude>` so the
///   marker does not transclude.
/// - Script modules: a call to the module-wikitext helper with a long-bracket
///   string whose level does not occur in `code`.
/// - Script and style sheets: a block comment.
pub fn wrap_marker(code: &str, doc: &Document, noinclude: bool) -> String {
    let mut code = code.to_string();
    if noinclude || doc.id.namespace() == Namespace::Subject("Template") {
        code = format!("<noinclude>{code}</noinclude>");
    }

    match doc.kind {
        ContentKind::Scribunto => {
            let mut equals = String::new();
            while code.contains(&format!("]{equals}]")) {
                equals.push('=');
            }
            format!("require('Module:Module wikitext')._addText([{equals}[{code}]{equals}]);")
        }
        ContentKind::Javascript | ContentKind::Css | ContentKind::SanitizedCss => {
            format!("/* {code} */")
        }
        ContentKind::Wikitext | ContentKind::Json | ContentKind::Text => code,
    }
}
