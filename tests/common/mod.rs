#![allow(dead_code)]

use domxpath::{Document, NodeId};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// An XML stylesheet that wraps an html body with two `div` children.
pub fn stylesheet_with_divs(first: &str, second: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="ISO-8859-1"?>
<xsl:stylesheet version="1.0" xmlns:xsl="http://myNS">
  <xsl:template match="/">
  <html>
    <body>
      {first}
      {second}
    </body>
  </html>
  </xsl:template>
</xsl:stylesheet>"#
    )
}

/// Two anonymous sibling divs.
pub fn plain_divs() -> Document {
    parse(&stylesheet_with_divs("<div/>", "<div/>"))
}

/// Two sibling divs with ids `id1` and `id2`.
pub fn identified_divs() -> Document {
    parse(&stylesheet_with_divs("<div id='id1'/>", "<div id=\"id2\"/>"))
}

/// An html page with a nested structure for path and axis tests.
pub fn page() -> Document {
    parse(
        r#"<html>
  <head><title>foo</title></head>
  <body>
    <div id="level1">
      <p id="only">only child</p>
    </div>
    <div id="level2">
      <span id="s1">1</span><span id="s2">2</span><span id="s3">3</span>
    </div>
    <ul class="list">
      <li>a</li><li>b</li><li>c</li><li>d</li>
    </ul>
  </body>
</html>"#,
    )
}

pub fn parse(text: &str) -> Document {
    init_logger();
    Document::parse(text).expect("fixture should parse")
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// The `id` attributes of the given elements.
pub fn ids(doc: &Document, nodes: &[NodeId]) -> Vec<String> {
    nodes
        .iter()
        .map(|&node| doc.attribute(node, "id").unwrap_or_default().to_string())
        .collect()
}
