//! Block model and the block kind classifier.
//!
//! Every block the content API can return maps onto one [`BlockKind`] variant. The
//! classifier derives a stable tag from the variant's type name (`Heading1Block` becomes
//! `heading_1`), which the renderer uses as its dispatch key. Adding a kind means adding a
//! variant, and the exhaustive matches below make the compiler point at every place that
//! needs to learn about it.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Paragraph,
    Heading1,
    Heading2,
    Heading3,
    BulletedListItem,
    NumberedListItem,
    ToDo,
    Toggle,
    Code,
    Quote,
    Callout,
    Divider,
    Equation,
    Image,
    Video,
    Audio,
    File,
    Pdf,
    Bookmark,
    Embed,
    LinkPreview,
    LinkToPage,
    Table,
    TableRow,
    ColumnList,
    Column,
    ChildPage,
    ChildDatabase,
    TableOfContents,
    Breadcrumb,
    SyncedBlock,
    Template,
    Unsupported,
}

impl BlockKind {
    pub const ALL: [BlockKind; 33] = [
        BlockKind::Paragraph,
        BlockKind::Heading1,
        BlockKind::Heading2,
        BlockKind::Heading3,
        BlockKind::BulletedListItem,
        BlockKind::NumberedListItem,
        BlockKind::ToDo,
        BlockKind::Toggle,
        BlockKind::Code,
        BlockKind::Quote,
        BlockKind::Callout,
        BlockKind::Divider,
        BlockKind::Equation,
        BlockKind::Image,
        BlockKind::Video,
        BlockKind::Audio,
        BlockKind::File,
        BlockKind::Pdf,
        BlockKind::Bookmark,
        BlockKind::Embed,
        BlockKind::LinkPreview,
        BlockKind::LinkToPage,
        BlockKind::Table,
        BlockKind::TableRow,
        BlockKind::ColumnList,
        BlockKind::Column,
        BlockKind::ChildPage,
        BlockKind::ChildDatabase,
        BlockKind::TableOfContents,
        BlockKind::Breadcrumb,
        BlockKind::SyncedBlock,
        BlockKind::Template,
        BlockKind::Unsupported,
    ];

    /// Concrete type name of the kind, carrying the structural `Block` suffix.
    pub const fn type_name(self) -> &'static str {
        match self {
            BlockKind::Paragraph => "ParagraphBlock",
            BlockKind::Heading1 => "Heading1Block",
            BlockKind::Heading2 => "Heading2Block",
            BlockKind::Heading3 => "Heading3Block",
            BlockKind::BulletedListItem => "BulletedListItemBlock",
            BlockKind::NumberedListItem => "NumberedListItemBlock",
            BlockKind::ToDo => "ToDoBlock",
            BlockKind::Toggle => "ToggleBlock",
            BlockKind::Code => "CodeBlock",
            BlockKind::Quote => "QuoteBlock",
            BlockKind::Callout => "CalloutBlock",
            BlockKind::Divider => "DividerBlock",
            BlockKind::Equation => "EquationBlock",
            BlockKind::Image => "ImageBlock",
            BlockKind::Video => "VideoBlock",
            BlockKind::Audio => "AudioBlock",
            BlockKind::File => "FileBlock",
            BlockKind::Pdf => "PdfBlock",
            BlockKind::Bookmark => "BookmarkBlock",
            BlockKind::Embed => "EmbedBlock",
            BlockKind::LinkPreview => "LinkPreviewBlock",
            BlockKind::LinkToPage => "LinkToPageBlock",
            BlockKind::Table => "TableBlock",
            BlockKind::TableRow => "TableRowBlock",
            BlockKind::ColumnList => "ColumnListBlock",
            BlockKind::Column => "ColumnBlock",
            BlockKind::ChildPage => "ChildPageBlock",
            BlockKind::ChildDatabase => "ChildDatabaseBlock",
            BlockKind::TableOfContents => "TableOfContentsBlock",
            BlockKind::Breadcrumb => "BreadcrumbBlock",
            BlockKind::SyncedBlock => "SyncedBlockBlock",
            BlockKind::Template => "TemplateBlock",
            BlockKind::Unsupported => "UnsupportedBlock",
        }
    }

    /// Lowercase, underscore separated dispatch tag, e.g. `child_database`.
    pub fn tag(self) -> String {
        let name = self.type_name();
        camel_case_to_underscore(name.strip_suffix("Block").unwrap_or(name))
    }

    /// Maps the API's `type` discriminator onto a kind. Unknown types become `Unsupported`.
    pub fn from_api_type(kind: &str) -> Self {
        match kind {
            "paragraph" => BlockKind::Paragraph,
            "heading_1" => BlockKind::Heading1,
            "heading_2" => BlockKind::Heading2,
            "heading_3" => BlockKind::Heading3,
            "bulleted_list_item" => BlockKind::BulletedListItem,
            "numbered_list_item" => BlockKind::NumberedListItem,
            "to_do" => BlockKind::ToDo,
            "toggle" => BlockKind::Toggle,
            "code" => BlockKind::Code,
            "quote" => BlockKind::Quote,
            "callout" => BlockKind::Callout,
            "divider" => BlockKind::Divider,
            "equation" => BlockKind::Equation,
            "image" => BlockKind::Image,
            "video" => BlockKind::Video,
            "audio" => BlockKind::Audio,
            "file" => BlockKind::File,
            "pdf" => BlockKind::Pdf,
            "bookmark" => BlockKind::Bookmark,
            "embed" => BlockKind::Embed,
            "link_preview" => BlockKind::LinkPreview,
            "link_to_page" => BlockKind::LinkToPage,
            "table" => BlockKind::Table,
            "table_row" => BlockKind::TableRow,
            "column_list" => BlockKind::ColumnList,
            "column" => BlockKind::Column,
            "child_page" => BlockKind::ChildPage,
            "child_database" => BlockKind::ChildDatabase,
            "table_of_contents" => BlockKind::TableOfContents,
            "breadcrumb" => BlockKind::Breadcrumb,
            "synced_block" => BlockKind::SyncedBlock,
            "template" => BlockKind::Template,
            _ => BlockKind::Unsupported,
        }
    }
}

/// Mixed case to lowercase-with-underscores: `_` goes before every uppercase letter and
/// every digit, except at the very first character.
pub fn camel_case_to_underscore(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (c.is_uppercase() || c.is_numeric()) {
            out.push('_');
        }
        out.extend(c.to_lowercase());
    }
    out
}

/// Shorthand for `block.kind.tag()`.
pub fn classify(block: &Block) -> String {
    block.kind.tag()
}

/// One node of a page's content tree.
///
/// `payload` is the kind-specific object the API nests under the block's type key; it is
/// only interpreted by the renderer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawBlock")]
pub struct Block {
    pub id: String,
    pub kind: BlockKind,
    pub has_children: bool,
    pub payload: Value,
    pub children: Vec<Block>,
}

impl Block {
    pub fn new(kind: BlockKind, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            has_children: false,
            payload: Value::Null,
            children: Vec::new(),
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_children(mut self, children: Vec<Block>) -> Self {
        self.has_children = !children.is_empty();
        self.children = children;
        self
    }

    /// For `ChildDatabase` blocks the block id doubles as the nested database id.
    pub fn child_database_id(&self) -> Option<&str> {
        match self.kind {
            BlockKind::ChildDatabase => Some(&self.id),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct RawBlock {
    id: String,
    #[serde(default)]
    has_children: bool,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    children: Vec<Block>,
    #[serde(flatten)]
    rest: serde_json::Map<String, Value>,
}

impl From<RawBlock> for Block {
    fn from(mut raw: RawBlock) -> Self {
        let payload = raw.rest.remove(&raw.kind).unwrap_or(Value::Null);
        Self {
            id: raw.id,
            kind: BlockKind::from_api_type(&raw.kind),
            has_children: raw.has_children,
            payload,
            children: raw.children,
        }
    }
}

/// Depth-first walk collecting the distinct child databases referenced anywhere in the tree,
/// in first-seen order.
pub fn child_databases(blocks: &[Block]) -> Vec<&Block> {
    fn walk<'a>(blocks: &'a [Block], found: &mut Vec<&'a Block>) {
        for block in blocks {
            if let Some(id) = block.child_database_id() {
                if !found.iter().any(|b| b.id == id) {
                    found.push(block);
                }
            }
            walk(&block.children, found);
        }
    }

    let mut found = Vec::new();
    walk(blocks, &mut found);
    found
}
