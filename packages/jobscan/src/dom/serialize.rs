//! HTML serialization of the live tree.

use super::{Dom, NodeId, NodeKind};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "noscript", "xmp", "iframe", "noembed", "noframes"];

impl Dom {
    /// Serialize the live tree; shadow roots become declarative templates.
    pub fn to_html(&self) -> String {
        let mut out = String::from("<!DOCTYPE html>");
        self.write_children(self.document(), &mut out, &mut None);
        out
    }

    /// Serialize while recording the element behind each emitted start tag.
    ///
    /// `None` entries stand for the template wrappers of shadow roots.
    pub(super) fn to_html_with_ordinals(&self) -> (String, Vec<Option<NodeId>>) {
        let mut out = String::from("<!DOCTYPE html>");
        let mut ordinals = Some(Vec::new());
        self.write_children(self.document(), &mut out, &mut ordinals);
        (out, ordinals.unwrap_or_default())
    }

    fn write_children(&self, parent: NodeId, out: &mut String, ordinals: &mut Option<Vec<Option<NodeId>>>) {
        // SVG and MathML `<style>`/`<script>` hold ordinary escaped text
        let raw = self
            .element(parent)
            .is_some_and(|el| !el.is_foreign() && RAW_TEXT_ELEMENTS.contains(&el.tag()));
        for &child in self.children(parent) {
            match self.kind(child) {
                Some(NodeKind::Text(text)) if raw => out.push_str(text),
                Some(NodeKind::Text(text)) => escape_text(text, out),
                Some(NodeKind::Element(_)) => self.write_element(child, out, ordinals),
                _ => {}
            }
        }
    }

    fn write_element(&self, id: NodeId, out: &mut String, ordinals: &mut Option<Vec<Option<NodeId>>>) {
        let Some(el) = self.element(id) else {
            return;
        };
        if let Some(list) = ordinals.as_mut() {
            list.push(Some(id));
        }
        out.push('<');
        out.push_str(el.tag());
        for (name, value) in el.attrs() {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            escape_attr(value, out);
            out.push('"');
        }
        out.push('>');
        if VOID_ELEMENTS.contains(&el.tag()) {
            return;
        }
        if let Some((root, mode)) = self.attached_shadow_root(id) {
            if let Some(list) = ordinals.as_mut() {
                list.push(None);
            }
            out.push_str("<template shadowrootmode=\"");
            out.push_str(mode.as_str());
            out.push_str("\">");
            self.write_children(root, out, ordinals);
            out.push_str("</template>");
        }
        self.write_children(id, out, ordinals);
        out.push_str("</");
        out.push_str(el.tag());
        out.push('>');
    }
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}
