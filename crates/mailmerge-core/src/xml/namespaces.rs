#![allow(non_snake_case)]

use super::xname::XName;

/// WordprocessingML main namespace. The one namespace the transforms touch
/// never varies at runtime, so a constant table is all that is needed.
pub mod W {
    use super::XName;
    pub const NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

    pub fn document() -> XName { XName::new(NS, "document") }
    pub fn r() -> XName { XName::new(NS, "r") }
    pub fn t() -> XName { XName::new(NS, "t") }
    pub fn br() -> XName { XName::new(NS, "br") }
    pub fn fldSimple() -> XName { XName::new(NS, "fldSimple") }
    pub fn fldChar() -> XName { XName::new(NS, "fldChar") }
    pub fn instrText() -> XName { XName::new(NS, "instrText") }
    pub fn instr() -> XName { XName::new(NS, "instr") }
    pub fn fldCharType() -> XName { XName::new(NS, "fldCharType") }
}

pub mod XMLNS {
    pub const NS: &str = "http://www.w3.org/2000/xmlns/";
}

pub mod XML {
    pub const NS: &str = "http://www.w3.org/XML/1998/namespace";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_namespace_creates_valid_xnames() {
        let t = W::t();
        assert_eq!(t.namespace, Some(W::NS.to_string()));
        assert_eq!(t.local_name, "t");
    }
}
