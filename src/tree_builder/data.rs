//! DOCTYPE classification: which doctypes are errors, and which quirks
//! mode they select.

use crate::interface::QuirksMode;
use crate::tokenizer::Doctype;

/// Public identifier prefixes that force quirks mode, matched ASCII
/// case-insensitively.
static QUIRKY_PUBLIC_PREFIXES: &[&str] = &[
    "+//silmaril//dtd html pro v0r11 19970101//",
    "-//advasoft ltd//dtd html 3.0 aswedit + extensions//",
    "-//as//dtd html 3.0 aswedit + extensions//",
    "-//ietf//dtd html 2.0 level 1//",
    "-//ietf//dtd html 2.0 level 2//",
    "-//ietf//dtd html 2.0 strict level 1//",
    "-//ietf//dtd html 2.0 strict level 2//",
    "-//ietf//dtd html 2.0 strict//",
    "-//ietf//dtd html 2.0//",
    "-//ietf//dtd html 2.1e//",
    "-//ietf//dtd html 3.0//",
    "-//ietf//dtd html 3.2 final//",
    "-//ietf//dtd html 3.2//",
    "-//ietf//dtd html 3//",
    "-//ietf//dtd html level 0//",
    "-//ietf//dtd html level 1//",
    "-//ietf//dtd html level 2//",
    "-//ietf//dtd html level 3//",
    "-//ietf//dtd html strict level 0//",
    "-//ietf//dtd html strict level 1//",
    "-//ietf//dtd html strict level 2//",
    "-//ietf//dtd html strict level 3//",
    "-//ietf//dtd html strict//",
    "-//ietf//dtd html//",
    "-//metrius//dtd metrius presentational//",
    "-//microsoft//dtd internet explorer 2.0 html strict//",
    "-//microsoft//dtd internet explorer 2.0 html//",
    "-//microsoft//dtd internet explorer 2.0 tables//",
    "-//microsoft//dtd internet explorer 3.0 html strict//",
    "-//microsoft//dtd internet explorer 3.0 html//",
    "-//microsoft//dtd internet explorer 3.0 tables//",
    "-//netscape comm. corp.//dtd html//",
    "-//netscape comm. corp.//dtd strict html//",
    "-//o'reilly and associates//dtd html 2.0//",
    "-//o'reilly and associates//dtd html extended 1.0//",
    "-//o'reilly and associates//dtd html extended relaxed 1.0//",
    "-//sq//dtd html 2.0 hotmetal + extensions//",
    "-//softquad software//dtd hotmetal pro 6.0::19990601::extensions to html 4.0//",
    "-//softquad//dtd hotmetal pro 4.0::19971010::extensions to html 4.0//",
    "-//spyglass//dtd html 2.0 extended//",
    "-//sun microsystems corp.//dtd hotjava html//",
    "-//sun microsystems corp.//dtd hotjava strict html//",
    "-//w3c//dtd html 3 1995-03-24//",
    "-//w3c//dtd html 3.2 draft//",
    "-//w3c//dtd html 3.2 final//",
    "-//w3c//dtd html 3.2//",
    "-//w3c//dtd html 3.2s draft//",
    "-//w3c//dtd html 4.0 frameset//",
    "-//w3c//dtd html 4.0 transitional//",
    "-//w3c//dtd html experimental 19960712//",
    "-//w3c//dtd html experimental 970421//",
    "-//w3c//dtd w3 html//",
    "-//w3o//dtd w3 html 3.0//",
    "-//webtechs//dtd mozilla html 2.0//",
    "-//webtechs//dtd mozilla html//",
];

/// Public identifiers (full string) that force quirks mode.
static QUIRKY_PUBLIC_MATCHES: &[&str] = &[
    "-//w3o//dtd w3 html strict 3.0//en//",
    "-/w3c/dtd html 4.0 transitional/en",
    "html",
];

/// Prefixes that force quirks only when no system identifier is present,
/// and limited quirks when one is.
static HTML4_PUBLIC_PREFIXES: &[&str] = &[
    "-//w3c//dtd html 4.01 frameset//",
    "-//w3c//dtd html 4.01 transitional//",
];

static LIMITED_QUIRKY_PUBLIC_PREFIXES: &[&str] = &[
    "-//w3c//dtd xhtml 1.0 frameset//",
    "-//w3c//dtd xhtml 1.0 transitional//",
];

static QUIRKY_SYSTEM_MATCHES: &[&str] =
    &["http://www.ibm.com/data/dtd/v11/ibmxhtml1-transitional.dtd"];

fn contains_prefix_ignore_case(prefixes: &[&str], id: &str) -> bool {
    let id = id.to_ascii_lowercase();
    prefixes.iter().any(|p| id.starts_with(p))
}

fn contains_ignore_case(matches: &[&str], id: &str) -> bool {
    matches.iter().any(|m| m.eq_ignore_ascii_case(id))
}

/// Is this doctype a parse error, and what quirks mode does it select?
///
/// Documents parsed from an iframe's `srcdoc` attribute are exempt from
/// doctype-based quirks.
pub(crate) fn doctype_error_and_quirks(doctype: &Doctype, iframe_srcdoc: bool) -> (bool, QuirksMode) {
    fn opt_as_str(x: &Option<tendril::StrTendril>) -> Option<&str> {
        x.as_ref().map(|s| &**s)
    }

    let name = opt_as_str(&doctype.name);
    let public = opt_as_str(&doctype.public_id);
    let system = opt_as_str(&doctype.system_id);

    let err = match (name, public, system) {
        (Some("html"), None, None) | (Some("html"), None, Some("about:legacy-compat")) => false,
        _ => true,
    };

    let quirk = match (name, public, system) {
        _ if iframe_srcdoc => QuirksMode::NoQuirks,
        _ if doctype.force_quirks => QuirksMode::Quirks,
        (name, _, _) if name != Some("html") => QuirksMode::Quirks,

        (_, Some(p), _) if contains_ignore_case(QUIRKY_PUBLIC_MATCHES, p) => QuirksMode::Quirks,
        (_, _, Some(s)) if contains_ignore_case(QUIRKY_SYSTEM_MATCHES, s) => QuirksMode::Quirks,

        (_, Some(p), _) if contains_prefix_ignore_case(QUIRKY_PUBLIC_PREFIXES, p) => {
            QuirksMode::Quirks
        },
        (_, Some(p), None) if contains_prefix_ignore_case(HTML4_PUBLIC_PREFIXES, p) => {
            QuirksMode::Quirks
        },
        (_, Some(p), Some(_)) if contains_prefix_ignore_case(HTML4_PUBLIC_PREFIXES, p) => {
            QuirksMode::LimitedQuirks
        },

        (_, Some(p), _) if contains_prefix_ignore_case(LIMITED_QUIRKY_PUBLIC_PREFIXES, p) => {
            QuirksMode::LimitedQuirks
        },

        _ => QuirksMode::NoQuirks,
    };

    (err, quirk)
}

#[cfg(test)]
mod test {
    use super::*;
    use tendril::StrTendril;

    fn doctype(name: &str, public: Option<&str>, system: Option<&str>) -> Doctype {
        Doctype {
            name: Some(StrTendril::from_slice(name)),
            public_id: public.map(StrTendril::from_slice),
            system_id: system.map(StrTendril::from_slice),
            force_quirks: false,
        }
    }

    #[test]
    fn modern_doctype_is_no_quirks() {
        let (err, quirk) = doctype_error_and_quirks(&doctype("html", None, None), false);
        assert!(!err);
        assert_eq!(quirk, QuirksMode::NoQuirks);
    }

    #[test]
    fn html32_is_quirks() {
        let d = doctype("html", Some("-//W3C//DTD HTML 3.2 Final//EN"), None);
        let (err, quirk) = doctype_error_and_quirks(&d, false);
        assert!(err);
        assert_eq!(quirk, QuirksMode::Quirks);
    }

    #[test]
    fn html401_transitional_with_system_is_limited() {
        let d = doctype(
            "html",
            Some("-//W3C//DTD HTML 4.01 Transitional//EN"),
            Some("http://www.w3.org/TR/html4/loose.dtd"),
        );
        let (_, quirk) = doctype_error_and_quirks(&d, false);
        assert_eq!(quirk, QuirksMode::LimitedQuirks);
    }

    #[test]
    fn srcdoc_is_exempt() {
        let d = doctype("html", Some("html"), None);
        let (_, quirk) = doctype_error_and_quirks(&d, true);
        assert_eq!(quirk, QuirksMode::NoQuirks);
    }
}
