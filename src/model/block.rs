use super::blocks::*;
use super::common::BlockCommon;
use crate::types::{BlockId, RichTextItem};
use serde::{Deserialize, Serialize};

/// Macro to reduce boilerplate in Block enum methods
macro_rules! match_all_blocks {
    ($self:expr, $pattern:pat => $result:expr) => {
        match $self {
            Block::Paragraph($pattern) => $result,
            Block::Heading1($pattern) => $result,
            Block::Heading2($pattern) => $result,
            Block::Heading3($pattern) => $result,
            Block::BulletedListItem($pattern) => $result,
            Block::NumberedListItem($pattern) => $result,
            Block::ToDo($pattern) => $result,
            Block::Toggle($pattern) => $result,
            Block::Quote($pattern) => $result,
            Block::Callout($pattern) => $result,
            Block::Code($pattern) => $result,
            Block::Equation($pattern) => $result,
            Block::Divider($pattern) => $result,
            Block::Image($pattern) => $result,
            Block::Video($pattern) => $result,
            Block::File($pattern) => $result,
            Block::Pdf($pattern) => $result,
            Block::Bookmark($pattern) => $result,
            Block::Embed($pattern) => $result,
            Block::ChildPage($pattern) => $result,
            Block::Table($pattern) => $result,
            Block::TableRow($pattern) => $result,
            Block::ColumnList($pattern) => $result,
            Block::Column($pattern) => $result,
            Block::Synced($pattern) => $result,
            Block::LinkPreview($pattern) => $result,
            Block::Unsupported($pattern) => $result,
        }
    };
}

/// One node of a page's content tree.
///
/// Serialized with a `type` discriminator so the renderer can dispatch on it
/// directly. `children` inside `common` is filled in by the materializer,
/// never by the upstream API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Paragraph(ParagraphBlock),
    #[serde(rename = "heading_1")]
    Heading1(Heading1Block),
    #[serde(rename = "heading_2")]
    Heading2(Heading2Block),
    #[serde(rename = "heading_3")]
    Heading3(Heading3Block),
    BulletedListItem(BulletedListItemBlock),
    NumberedListItem(NumberedListItemBlock),
    ToDo(ToDoBlock),
    Toggle(ToggleBlock),
    Quote(QuoteBlock),
    Callout(CalloutBlock),
    Code(CodeBlock),
    Equation(EquationBlock),
    Divider(DividerBlock),
    Image(ImageBlock),
    Video(VideoBlock),
    File(FileBlock),
    Pdf(PdfBlock),
    Bookmark(BookmarkBlock),
    Embed(EmbedBlock),
    ChildPage(ChildPageBlock),
    Table(TableBlock),
    TableRow(TableRowBlock),
    ColumnList(ColumnListBlock),
    Column(ColumnBlock),
    #[serde(rename = "synced_block")]
    Synced(SyncedBlock),
    LinkPreview(LinkPreviewBlock),
    Unsupported(UnsupportedBlock),
}

impl Block {
    /// Get the block's ID
    pub fn id(&self) -> &BlockId {
        match_all_blocks!(self, b => &b.common.id)
    }

    /// Get the block's children
    pub fn children(&self) -> &[Block] {
        match_all_blocks!(self, b => &b.common.children)
    }

    /// Check if block has children
    pub fn has_children(&self) -> bool {
        self.common().has_children
    }

    /// Get common block data
    pub fn common(&self) -> &BlockCommon {
        match_all_blocks!(self, b => &b.common)
    }

    /// Get mutable common block data
    pub fn common_mut(&mut self) -> &mut BlockCommon {
        match_all_blocks!(self, b => &mut b.common)
    }

    /// Set children
    pub fn set_children(&mut self, children: Vec<Block>) {
        self.common_mut().children = children;
    }

    /// The block whose children list holds this block's content.
    ///
    /// A synced copy has no children of its own; they live under the
    /// original it was synced from.
    pub fn children_source(&self) -> &BlockId {
        match self {
            Block::Synced(SyncedBlock {
                synced_from: Some(original),
                ..
            }) => original,
            other => other.id(),
        }
    }

    /// Get block type name
    pub fn block_type(&self) -> &str {
        match self {
            Block::Paragraph(_) => "paragraph",
            Block::Heading1(_) => "heading_1",
            Block::Heading2(_) => "heading_2",
            Block::Heading3(_) => "heading_3",
            Block::BulletedListItem(_) => "bulleted_list_item",
            Block::NumberedListItem(_) => "numbered_list_item",
            Block::ToDo(_) => "to_do",
            Block::Toggle(_) => "toggle",
            Block::Quote(_) => "quote",
            Block::Callout(_) => "callout",
            Block::Code(_) => "code",
            Block::Equation(_) => "equation",
            Block::Divider(_) => "divider",
            Block::Image(_) => "image",
            Block::Video(_) => "video",
            Block::File(_) => "file",
            Block::Pdf(_) => "pdf",
            Block::Bookmark(_) => "bookmark",
            Block::Embed(_) => "embed",
            Block::ChildPage(_) => "child_page",
            Block::Table(_) => "table",
            Block::TableRow(_) => "table_row",
            Block::ColumnList(_) => "column_list",
            Block::Column(_) => "column",
            Block::Synced(_) => "synced_block",
            Block::LinkPreview(_) => "link_preview",
            Block::Unsupported(b) => &b.block_type,
        }
    }

    /// Every rich-text array this block carries, in document order.
    ///
    /// This is the closed list of places inline equations can appear.
    pub fn rich_text_mut(&mut self) -> Vec<&mut Vec<RichTextItem>> {
        match self {
            Block::Paragraph(b) => vec![&mut b.content.rich_text],
            Block::Heading1(b) => vec![&mut b.content.rich_text],
            Block::Heading2(b) => vec![&mut b.content.rich_text],
            Block::Heading3(b) => vec![&mut b.content.rich_text],
            Block::BulletedListItem(b) => vec![&mut b.content.rich_text],
            Block::NumberedListItem(b) => vec![&mut b.content.rich_text],
            Block::ToDo(b) => vec![&mut b.content.rich_text],
            Block::Toggle(b) => vec![&mut b.content.rich_text],
            Block::Quote(b) => vec![&mut b.content.rich_text],
            Block::Callout(b) => vec![&mut b.content.rich_text],
            Block::Code(b) => vec![&mut b.content.rich_text, &mut b.caption],
            Block::Image(b) => vec![&mut b.caption],
            Block::Video(b) => vec![&mut b.caption],
            Block::File(b) => vec![&mut b.caption],
            Block::Pdf(b) => vec![&mut b.caption],
            Block::Bookmark(b) => vec![&mut b.caption],
            Block::TableRow(b) => b.cells.iter_mut().collect(),
            Block::Equation(_)
            | Block::Divider(_)
            | Block::Embed(_)
            | Block::ChildPage(_)
            | Block::Table(_)
            | Block::ColumnList(_)
            | Block::Column(_)
            | Block::Synced(_)
            | Block::LinkPreview(_)
            | Block::Unsupported(_) => Vec::new(),
        }
    }

    /// Number of nodes in the tree rooted here, this block included.
    pub fn tree_size(&self) -> usize {
        1 + self.children().iter().map(Block::tree_size).sum::<usize>()
    }

    /// Depth of the tree rooted here; a leaf has depth 1.
    pub fn tree_depth(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(Block::tree_depth)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RichTextItem;
    use pretty_assertions::assert_eq;

    fn paragraph(text: &str) -> Block {
        Block::Paragraph(ParagraphBlock {
            common: BlockCommon::new(BlockId::new_v4()),
            content: TextBlockContent {
                rich_text: vec![RichTextItem::plain_text(text)],
                ..Default::default()
            },
        })
    }

    #[test]
    fn test_serializes_with_type_tag() {
        let block = paragraph("hello");
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "paragraph");
        assert_eq!(json["common"]["has_children"], false);

        let back: Block = serde_json::from_value(json).unwrap();
        assert_eq!(back, block);
    }

    #[test]
    fn test_heading_tags_keep_upstream_spelling() {
        let block = Block::Heading2(Heading2Block {
            common: BlockCommon::new(BlockId::new_v4()),
            content: TextBlockContent::default(),
        });
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "heading_2");
        assert_eq!(block.block_type(), "heading_2");
    }

    #[test]
    fn test_rich_text_mut_covers_table_cells() {
        let mut row = Block::TableRow(TableRowBlock {
            common: BlockCommon::new(BlockId::new_v4()),
            cells: vec![
                vec![RichTextItem::plain_text("a")],
                vec![RichTextItem::plain_text("b")],
                vec![],
            ],
        });
        assert_eq!(row.rich_text_mut().len(), 3);
        assert!(paragraph("x").rich_text_mut().len() == 1);
    }

    #[test]
    fn test_tree_shape_helpers() {
        let mut root = paragraph("root");
        let mut child = paragraph("child");
        child.set_children(vec![paragraph("leaf")]);
        root.set_children(vec![child, paragraph("sibling")]);

        assert_eq!(root.tree_size(), 4);
        assert_eq!(root.tree_depth(), 3);
    }

    #[test]
    fn test_synced_copy_reads_children_from_original() {
        let original = BlockId::new_v4();
        let copy = Block::Synced(SyncedBlock {
            common: BlockCommon::new(BlockId::new_v4()),
            synced_from: Some(original.clone()),
        });
        assert_eq!(copy.children_source(), &original);

        let para = paragraph("p");
        assert_eq!(para.children_source(), para.id());
    }
}
