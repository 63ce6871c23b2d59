//! Foreign-content (SVG and MathML) name adjustment and integration-point
//! detection. Stateless: every decision is a function of names, attributes
//! and the current namespace.

use phf::phf_map;

use crate::interface::Namespace::*;
use crate::interface::{LocalName, Namespace, QualName};
use crate::tokenizer::Tag;

/// SVG tag names whose canonical spelling is mixed-case. The tokenizer has
/// already lowercased the name; this restores the case.
static SVG_TAG_ADJUSTMENTS: phf::Map<&'static str, &'static str> = phf_map! {
    "altglyph" => "altGlyph",
    "altglyphdef" => "altGlyphDef",
    "altglyphitem" => "altGlyphItem",
    "animatecolor" => "animateColor",
    "animatemotion" => "animateMotion",
    "animatetransform" => "animateTransform",
    "clippath" => "clipPath",
    "feblend" => "feBlend",
    "fecolormatrix" => "feColorMatrix",
    "fecomponenttransfer" => "feComponentTransfer",
    "fecomposite" => "feComposite",
    "feconvolvematrix" => "feConvolveMatrix",
    "fediffuselighting" => "feDiffuseLighting",
    "fedisplacementmap" => "feDisplacementMap",
    "fedistantlight" => "feDistantLight",
    "fedropshadow" => "feDropShadow",
    "feflood" => "feFlood",
    "fefunca" => "feFuncA",
    "fefuncb" => "feFuncB",
    "fefuncg" => "feFuncG",
    "fefuncr" => "feFuncR",
    "fegaussianblur" => "feGaussianBlur",
    "feimage" => "feImage",
    "femerge" => "feMerge",
    "femergenode" => "feMergeNode",
    "femorphology" => "feMorphology",
    "feoffset" => "feOffset",
    "fepointlight" => "fePointLight",
    "fespecularlighting" => "feSpecularLighting",
    "fespotlight" => "feSpotLight",
    "fetile" => "feTile",
    "feturbulence" => "feTurbulence",
    "foreignobject" => "foreignObject",
    "glyphref" => "glyphRef",
    "lineargradient" => "linearGradient",
    "radialgradient" => "radialGradient",
    "textpath" => "textPath",
};

/// SVG attribute names with canonical mixed-case spellings.
static SVG_ATTR_ADJUSTMENTS: phf::Map<&'static str, &'static str> = phf_map! {
    "attributename" => "attributeName",
    "attributetype" => "attributeType",
    "basefrequency" => "baseFrequency",
    "baseprofile" => "baseProfile",
    "calcmode" => "calcMode",
    "clippathunits" => "clipPathUnits",
    "diffuseconstant" => "diffuseConstant",
    "edgemode" => "edgeMode",
    "filterunits" => "filterUnits",
    "glyphref" => "glyphRef",
    "gradienttransform" => "gradientTransform",
    "gradientunits" => "gradientUnits",
    "kernelmatrix" => "kernelMatrix",
    "kernelunitlength" => "kernelUnitLength",
    "keypoints" => "keyPoints",
    "keysplines" => "keySplines",
    "keytimes" => "keyTimes",
    "lengthadjust" => "lengthAdjust",
    "limitingconeangle" => "limitingConeAngle",
    "markerheight" => "markerHeight",
    "markerunits" => "markerUnits",
    "markerwidth" => "markerWidth",
    "maskcontentunits" => "maskContentUnits",
    "maskunits" => "maskUnits",
    "numoctaves" => "numOctaves",
    "pathlength" => "pathLength",
    "patterncontentunits" => "patternContentUnits",
    "patterntransform" => "patternTransform",
    "patternunits" => "patternUnits",
    "pointsatx" => "pointsAtX",
    "pointsaty" => "pointsAtY",
    "pointsatz" => "pointsAtZ",
    "preservealpha" => "preserveAlpha",
    "preserveaspectratio" => "preserveAspectRatio",
    "primitiveunits" => "primitiveUnits",
    "refx" => "refX",
    "refy" => "refY",
    "repeatcount" => "repeatCount",
    "repeatdur" => "repeatDur",
    "requiredextensions" => "requiredExtensions",
    "requiredfeatures" => "requiredFeatures",
    "specularconstant" => "specularConstant",
    "specularexponent" => "specularExponent",
    "spreadmethod" => "spreadMethod",
    "startoffset" => "startOffset",
    "stddeviation" => "stdDeviation",
    "stitchtiles" => "stitchTiles",
    "surfacescale" => "surfaceScale",
    "systemlanguage" => "systemLanguage",
    "tablevalues" => "tableValues",
    "targetx" => "targetX",
    "targety" => "targetY",
    "textlength" => "textLength",
    "viewbox" => "viewBox",
    "viewtarget" => "viewTarget",
    "xchannelselector" => "xChannelSelector",
    "ychannelselector" => "yChannelSelector",
    "zoomandpan" => "zoomAndPan",
};

/// Canonical spelling for an SVG tag name, if it differs from the
/// lowercased form.
pub fn adjusted_svg_tag_name(name: &str) -> Option<&'static str> {
    SVG_TAG_ADJUSTMENTS.get(name).copied()
}

pub fn adjust_svg_tag_name(tag: &mut Tag) {
    if let Some(adjusted) = adjusted_svg_tag_name(&tag.name) {
        tag.name = LocalName::from(adjusted);
    }
}

pub fn adjust_svg_attributes(tag: &mut Tag) {
    for attr in &mut tag.attrs {
        if let Some(&adjusted) = SVG_ATTR_ADJUSTMENTS.get(&*attr.name.local) {
            attr.name.local = LocalName::from(adjusted);
        }
    }
}

pub fn adjust_mathml_attributes(tag: &mut Tag) {
    for attr in &mut tag.attrs {
        if &*attr.name.local == "definitionurl" {
            attr.name.local = LocalName::from("definitionURL");
        }
    }
}

/// Split `xlink:`/`xml:`/`xmlns:` attribute names into prefixed qualified
/// names in their proper namespaces.
pub fn adjust_foreign_attributes(tag: &mut Tag) {
    for attr in &mut tag.attrs {
        let replacement = match &*attr.name.local {
            "xlink:actuate" => Some(("xlink", XLink, "actuate")),
            "xlink:arcrole" => Some(("xlink", XLink, "arcrole")),
            "xlink:href" => Some(("xlink", XLink, "href")),
            "xlink:role" => Some(("xlink", XLink, "role")),
            "xlink:show" => Some(("xlink", XLink, "show")),
            "xlink:title" => Some(("xlink", XLink, "title")),
            "xlink:type" => Some(("xlink", XLink, "type")),
            "xml:lang" => Some(("xml", Xml, "lang")),
            "xml:space" => Some(("xml", Xml, "space")),
            "xmlns:xlink" => Some(("xmlns", XmlNs, "xlink")),
            _ => None,
        };
        if let Some((prefix, ns, local)) = replacement {
            attr.name = QualName::new(Some(prefix), ns, LocalName::from(local));
        } else if &*attr.name.local == "xmlns" {
            attr.name = QualName::new(None, XmlNs, LocalName::from("xmlns"));
        }
    }
}

/// SVG foreignObject/desc/title, and MathML annotation-xml with an HTML
/// encoding (the caller supplies that flag, which lives on the element).
pub fn is_html_integration_point(ns: Namespace, name: &str, annotation_xml_html: bool) -> bool {
    match ns {
        Svg => matches!(name, "foreignObject" | "desc" | "title"),
        MathMl => name == "annotation-xml" && annotation_xml_html,
        _ => false,
    }
}

pub fn is_mathml_text_integration_point(ns: Namespace, name: &str) -> bool {
    ns == MathMl && matches!(name, "mi" | "mo" | "mn" | "ms" | "mtext")
}

/// HTML start tags that break out of foreign content. `<font>` only counts
/// when it carries a color/face/size attribute.
pub fn is_breakout_tag(tag: &Tag) -> bool {
    match &*tag.name {
        "b" | "big" | "blockquote" | "body" | "br" | "center" | "code" | "dd" | "div" | "dl"
        | "dt" | "em" | "embed" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "head" | "hr"
        | "i" | "img" | "li" | "listing" | "menu" | "meta" | "nobr" | "ol" | "p" | "pre"
        | "ruby" | "s" | "small" | "span" | "strong" | "strike" | "sub" | "sup" | "table"
        | "tt" | "u" | "ul" | "var" => true,
        "font" => tag
            .attrs
            .iter()
            .any(|a| matches!(&*a.name.local, "color" | "face" | "size")),
        _ => false,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::interface::Attribute;
    use crate::tokenizer::StartTag;
    use tendril::StrTendril;

    fn start_tag(name: &str, attrs: Vec<(&str, &str)>) -> Tag {
        Tag {
            kind: StartTag,
            name: LocalName::from(name),
            self_closing: false,
            attrs: attrs
                .into_iter()
                .map(|(k, v)| Attribute {
                    name: QualName::html(k),
                    value: StrTendril::from_slice(v),
                })
                .collect(),
        }
    }

    #[test]
    fn svg_case_restoration() {
        assert_eq!(adjusted_svg_tag_name("clippath"), Some("clipPath"));
        assert_eq!(adjusted_svg_tag_name("foreignobject"), Some("foreignObject"));
        assert_eq!(adjusted_svg_tag_name("circle"), None);

        let mut tag = start_tag("lineargradient", vec![("gradientunits", "userSpaceOnUse")]);
        adjust_svg_tag_name(&mut tag);
        adjust_svg_attributes(&mut tag);
        assert_eq!(&*tag.name, "linearGradient");
        assert_eq!(&*tag.attrs[0].name.local, "gradientUnits");
    }

    #[test]
    fn foreign_attribute_namespaces() {
        let mut tag = start_tag("use", vec![("xlink:href", "#a"), ("xml:lang", "en")]);
        adjust_foreign_attributes(&mut tag);
        assert_eq!(tag.attrs[0].name.prefix, Some("xlink"));
        assert_eq!(tag.attrs[0].name.ns, XLink);
        assert_eq!(&*tag.attrs[0].name.local, "href");
        assert_eq!(tag.attrs[1].name.ns, Xml);
    }

    #[test]
    fn font_breakout_depends_on_attrs() {
        assert!(!is_breakout_tag(&start_tag("font", vec![("id", "x")])));
        assert!(is_breakout_tag(&start_tag("font", vec![("color", "red")])));
        assert!(is_breakout_tag(&start_tag("p", vec![])));
        assert!(!is_breakout_tag(&start_tag("circle", vec![])));
    }

    #[test]
    fn integration_points() {
        assert!(is_html_integration_point(Svg, "foreignObject", false));
        assert!(is_html_integration_point(MathMl, "annotation-xml", true));
        assert!(!is_html_integration_point(MathMl, "annotation-xml", false));
        assert!(is_mathml_text_integration_point(MathMl, "mo"));
        assert!(!is_mathml_text_integration_point(Svg, "mo"));
    }
}
