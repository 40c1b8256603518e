// src/api/notion_client_adapter.rs
//! Adapter layer for converting notion-client types to our domain model.
//!
//! Blocks arrive as raw JSON. Anything notion-client can decode goes through
//! its typed `BlockType`; anything it cannot is still kept, as an
//! `Unsupported` block carrying the upstream type name, so a page never loses
//! content ordering because of a block type this crate does not render.

use super::responses::NotionBlock;
use crate::error::{AppError, NotionClientError};
use crate::model::blocks::*;
use crate::model::common::BlockCommon;
use crate::model::Block;
use crate::types::{
    Annotations, BlockId, Color, DatabaseId, EquationData, Link, Mention, PageId, RichTextItem,
    RichTextType, TextContent,
};
use serde_json::Value;

/// Convert one raw block object into the domain block.
///
/// Returns `Ok(None)` for partial objects (no `type` field), which the
/// listing endpoints emit for blocks the integration cannot fully read.
pub fn convert_raw_block(raw: Value) -> Result<Option<Block>, AppError> {
    let Some(type_name) = raw.get("type").and_then(Value::as_str).map(str::to_string) else {
        log::debug!(
            "Skipping partial block {}",
            raw.get("id").and_then(Value::as_str).unwrap_or("<no id>")
        );
        return Ok(None);
    };

    match serde_json::from_value::<NotionBlock>(raw.clone()) {
        Ok(notion_block) => convert_block(notion_block, &type_name, &raw).map(Some),
        Err(e) => {
            log::debug!(
                "notion-client could not decode '{}' block, keeping it as unsupported: {}",
                type_name,
                e
            );
            Ok(Some(Block::Unsupported(UnsupportedBlock {
                common: raw_block_common(&raw)?,
                block_type: type_name,
            })))
        }
    }
}

/// Convert notion-client Block to our domain Block
///
/// `raw` is the same object as JSON; it supplies the few fields notion-client's
/// value types leave out (media captions, the code language spelling).
pub fn convert_block(
    notion_block: NotionBlock,
    type_name: &str,
    raw: &Value,
) -> Result<Block, AppError> {
    let common = convert_block_common(&notion_block)?;

    use notion_client::objects::block::BlockType;

    match notion_block.block_type {
        BlockType::Paragraph { paragraph } => Ok(Block::Paragraph(ParagraphBlock {
            common,
            content: convert_text_block_content(paragraph.rich_text, paragraph.color)?,
        })),

        BlockType::Heading1 { heading_1 } => Ok(Block::Heading1(Heading1Block {
            common,
            content: convert_text_block_content(heading_1.rich_text, heading_1.color)?,
        })),

        BlockType::Heading2 { heading_2 } => Ok(Block::Heading2(Heading2Block {
            common,
            content: convert_text_block_content(heading_2.rich_text, heading_2.color)?,
        })),

        BlockType::Heading3 { heading_3 } => Ok(Block::Heading3(Heading3Block {
            common,
            content: convert_text_block_content(heading_3.rich_text, heading_3.color)?,
        })),

        BlockType::BulletedListItem { bulleted_list_item } => {
            Ok(Block::BulletedListItem(BulletedListItemBlock {
                common,
                content: convert_text_block_content(
                    bulleted_list_item.rich_text,
                    Some(bulleted_list_item.color),
                )?,
            }))
        }

        BlockType::NumberedListItem { numbered_list_item } => {
            Ok(Block::NumberedListItem(NumberedListItemBlock {
                common,
                content: convert_text_block_content(
                    numbered_list_item.rich_text,
                    Some(numbered_list_item.color),
                )?,
            }))
        }

        BlockType::ToDo { to_do } => Ok(Block::ToDo(ToDoBlock {
            common,
            content: convert_text_block_content(to_do.rich_text, to_do.color)?,
            checked: to_do.checked.unwrap_or(false),
        })),

        BlockType::Toggle { toggle } => Ok(Block::Toggle(ToggleBlock {
            common,
            content: convert_text_block_content(toggle.rich_text, Some(toggle.color))?,
        })),

        BlockType::Quote { quote } => Ok(Block::Quote(QuoteBlock {
            common,
            content: convert_text_block_content(quote.rich_text, Some(quote.color))?,
        })),

        BlockType::Code { code } => Ok(Block::Code(CodeBlock {
            common,
            language: raw
                .pointer("/code/language")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("{:?}", code.language).to_lowercase()),
            caption: convert_rich_text_array(code.caption)?,
            content: convert_text_block_content(code.rich_text, None)?,
        })),

        BlockType::Divider { .. } => Ok(Block::Divider(DividerBlock { common })),

        BlockType::Bookmark { bookmark } => Ok(Block::Bookmark(BookmarkBlock {
            common,
            url: bookmark.url,
            caption: convert_rich_text_array(bookmark.caption)?,
            metadata: None,
        })),

        BlockType::Embed { embed } => Ok(Block::Embed(EmbedBlock {
            common,
            url: embed.url,
        })),

        BlockType::Equation { equation } => Ok(Block::Equation(EquationBlock {
            common,
            expression: equation.expression,
            markup: None,
        })),

        BlockType::ChildPage { child_page } => Ok(Block::ChildPage(ChildPageBlock {
            common,
            title: child_page.title,
        })),

        BlockType::Image { image } => Ok(Block::Image(ImageBlock {
            common,
            image: convert_file_object(image.file_type),
            caption: raw_caption(raw, type_name),
            dim: None,
            cache_expiry_time: None,
        })),

        BlockType::Video { video } => Ok(Block::Video(VideoBlock {
            common,
            video: convert_file_object(video.file_type),
            caption: raw_caption(raw, type_name),
        })),

        BlockType::File { file } => Ok(Block::File(FileBlock {
            common,
            file: convert_file_object(file.file_type),
            caption: convert_rich_text_array(file.caption)?,
        })),

        BlockType::Pdf { pdf } => Ok(Block::Pdf(PdfBlock {
            common,
            pdf: convert_file_object(pdf.file_type),
            caption: convert_rich_text_array(pdf.caption)?,
        })),

        BlockType::Callout { callout } => Ok(Block::Callout(CalloutBlock {
            common,
            icon: callout.icon.map(convert_icon),
            content: convert_text_block_content(callout.rich_text, Some(callout.color))?,
        })),

        BlockType::Table { table } => Ok(Block::Table(TableBlock {
            common,
            table_width: table.table_width as usize,
            has_column_header: table.has_column_header,
            has_row_header: table.has_row_header,
        })),

        BlockType::TableRow { table_row } => Ok(Block::TableRow(TableRowBlock {
            common,
            cells: table_row
                .cells
                .into_iter()
                .map(convert_rich_text_array)
                .collect::<Result<Vec<_>, _>>()?,
        })),

        BlockType::ColumnList { .. } => Ok(Block::ColumnList(ColumnListBlock { common })),

        BlockType::Column { .. } => Ok(Block::Column(ColumnBlock { common })),

        BlockType::SyncedBlock { synced_block } => {
            let synced_from = synced_block.synced_from.and_then(|sf| match sf {
                notion_client::objects::block::SyncedFrom::BlockId { block_id } => {
                    match BlockId::parse(&block_id) {
                        Ok(id) => Some(id),
                        Err(e) => {
                            log::warn!("Ignoring invalid synced_from id '{}': {}", block_id, e);
                            None
                        }
                    }
                }
            });
            Ok(Block::Synced(SyncedBlock {
                common,
                synced_from,
            }))
        }

        BlockType::LinkPreview { link_preview } => Ok(Block::LinkPreview(LinkPreviewBlock {
            common,
            url: link_preview.url,
        })),

        _ => Ok(Block::Unsupported(UnsupportedBlock {
            common,
            block_type: type_name.to_string(),
        })),
    }
}

/// Convert block common fields
fn convert_block_common(notion_block: &NotionBlock) -> Result<BlockCommon, AppError> {
    let id = BlockId::parse(&notion_block.id.clone().ok_or_else(|| {
        NotionClientError::ConversionError {
            message: "Block missing required ID field".to_string(),
        }
    })?)?;

    Ok(BlockCommon {
        id,
        children: Vec::new(),
        has_children: notion_block.has_children.unwrap_or(false),
        archived: notion_block.archived.unwrap_or(false),
    })
}

/// Common fields read straight from JSON, for blocks notion-client rejects.
fn raw_block_common(raw: &Value) -> Result<BlockCommon, AppError> {
    let id = raw
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| NotionClientError::ConversionError {
            message: "Block missing required ID field".to_string(),
        })?;

    Ok(BlockCommon {
        id: BlockId::parse(id)?,
        children: Vec::new(),
        has_children: raw
            .get("has_children")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        archived: raw.get("archived").and_then(Value::as_bool).unwrap_or(false),
    })
}

/// Caption of a media block, decoded from the raw payload.
///
/// Malformed captions degrade to an empty caption rather than failing the
/// block.
fn raw_caption(raw: &Value, type_name: &str) -> Vec<RichTextItem> {
    let Some(caption) = raw.get(type_name).and_then(|payload| payload.get("caption")) else {
        return Vec::new();
    };

    serde_json::from_value::<Vec<notion_client::objects::rich_text::RichText>>(caption.clone())
        .map_err(AppError::from)
        .and_then(convert_rich_text_array)
        .unwrap_or_else(|e| {
            log::debug!("Dropping unreadable {} caption: {}", type_name, e);
            Vec::new()
        })
}

/// Convert text block content (rich text + color)
fn convert_text_block_content(
    rich_text: Vec<notion_client::objects::rich_text::RichText>,
    color: Option<notion_client::objects::block::TextColor>,
) -> Result<TextBlockContent, AppError> {
    Ok(TextBlockContent {
        rich_text: convert_rich_text_array(rich_text)?,
        color: convert_block_color(
            color.unwrap_or(notion_client::objects::block::TextColor::Default),
        ),
    })
}

/// Convert array of rich text items
fn convert_rich_text_array(
    rich_texts: Vec<notion_client::objects::rich_text::RichText>,
) -> Result<Vec<RichTextItem>, AppError> {
    rich_texts.into_iter().map(convert_rich_text).collect()
}

/// Convert single rich text item
fn convert_rich_text(
    rich_text: notion_client::objects::rich_text::RichText,
) -> Result<RichTextItem, AppError> {
    use notion_client::objects::rich_text::RichText as NcRichText;

    match rich_text {
        NcRichText::Text {
            text,
            annotations,
            plain_text,
            href,
        } => Ok(RichTextItem {
            text_type: RichTextType::Text {
                text: TextContent {
                    content: text.content,
                    link: text.link.map(|link| Link { url: link.url }),
                },
            },
            annotations: convert_annotations(annotations.unwrap_or_default()),
            plain_text: plain_text.unwrap_or_default(),
            href,
        }),

        NcRichText::Mention {
            mention,
            annotations,
            plain_text,
            href,
        } => {
            let mention = convert_mention(mention).unwrap_or_else(|| Mention::Link {
                url: href.clone().unwrap_or_default(),
            });

            Ok(RichTextItem {
                text_type: RichTextType::Mention { mention },
                annotations: convert_annotations(annotations),
                plain_text,
                href,
            })
        }

        NcRichText::Equation {
            equation,
            annotations,
            plain_text,
            href,
        } => Ok(RichTextItem {
            text_type: RichTextType::Equation {
                equation: EquationData {
                    expression: equation.expression,
                    markup: None,
                },
            },
            annotations: convert_annotations(annotations),
            plain_text,
            href,
        }),

        #[allow(unreachable_patterns)]
        _ => Ok(RichTextItem::plain_text("")),
    }
}

/// Convert annotations
fn convert_annotations(annotations: notion_client::objects::rich_text::Annotations) -> Annotations {
    Annotations {
        bold: annotations.bold,
        italic: annotations.italic,
        strikethrough: annotations.strikethrough,
        underline: annotations.underline,
        code: annotations.code,
        color: convert_rich_text_color(annotations.color),
    }
}

/// Convert a mention. `None` means the caller should fall back to the span's href.
fn convert_mention(mention: notion_client::objects::rich_text::Mention) -> Option<Mention> {
    use notion_client::objects::rich_text::Mention as NcMention;

    match mention {
        NcMention::User { user } => Some(Mention::User { name: user.name }),
        NcMention::Page { page } => PageId::parse(&page.id)
            .ok()
            .map(|id| Mention::Page { id }),
        NcMention::Database { database } => DatabaseId::parse(&database.id)
            .ok()
            .map(|id| Mention::Database { id }),
        NcMention::Date { date } => Some(Mention::Date {
            start: date.start.to_rfc3339(),
            end: date.end.map(|end| end.to_rfc3339()),
        }),
        NcMention::LinkPreview { link_preview } => Some(Mention::Link {
            url: link_preview.url,
        }),
        #[allow(unreachable_patterns)]
        _ => {
            log::debug!("Unsupported mention type encountered, using href");
            None
        }
    }
}

/// Convert file object from notion-client to our domain type
fn convert_file_object(file: notion_client::objects::file::File) -> FileObject {
    use notion_client::objects::file::File as NcFile;

    match file {
        NcFile::External { external } => FileObject::External {
            external: ExternalFile { url: external.url },
        },
        NcFile::File { file } => FileObject::File {
            file: NotionFile {
                url: file.url,
                expiry_time: Some(file.expiry_time),
            },
        },
    }
}

fn convert_icon(icon: notion_client::objects::block::Icon) -> Icon {
    use notion_client::objects::block::Icon as NcIcon;

    match icon {
        NcIcon::Emoji(notion_client::objects::emoji::Emoji::Emoji { emoji }) => {
            Icon::Emoji { emoji }
        }
        NcIcon::File(file) => match convert_file_object(file) {
            FileObject::File { file } => Icon::File { file },
            FileObject::External { external } => Icon::External { external },
        },
    }
}

/// Generates a color conversion function from a Notion color enum to our Color type.
macro_rules! impl_color_conversion {
    ($fn_name:ident, $source:ty) => {
        fn $fn_name(color: $source) -> Color {
            match color {
                <$source>::Default => Color::Default,
                <$source>::Gray => Color::Gray,
                <$source>::Brown => Color::Brown,
                <$source>::Orange => Color::Orange,
                <$source>::Yellow => Color::Yellow,
                <$source>::Green => Color::Green,
                <$source>::Blue => Color::Blue,
                <$source>::Purple => Color::Purple,
                <$source>::Pink => Color::Pink,
                <$source>::Red => Color::Red,
                <$source>::GrayBackground => Color::GrayBackground,
                <$source>::BrownBackground => Color::BrownBackground,
                <$source>::OrangeBackground => Color::OrangeBackground,
                <$source>::YellowBackground => Color::YellowBackground,
                <$source>::GreenBackground => Color::GreenBackground,
                <$source>::BlueBackground => Color::BlueBackground,
                <$source>::PurpleBackground => Color::PurpleBackground,
                <$source>::PinkBackground => Color::PinkBackground,
                <$source>::RedBackground => Color::RedBackground,
            }
        }
    };
}

impl_color_conversion!(convert_block_color, notion_client::objects::block::TextColor);
impl_color_conversion!(
    convert_rich_text_color,
    notion_client::objects::rich_text::TextColor
);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn paragraph_json(id: &str, text: &str) -> Value {
        json!({
            "object": "block",
            "id": id,
            "type": "paragraph",
            "has_children": false,
            "archived": false,
            "created_time": "2024-01-01T00:00:00.000Z",
            "last_edited_time": "2024-01-01T00:00:00.000Z",
            "paragraph": {
                "rich_text": [{
                    "type": "text",
                    "text": { "content": text, "link": null },
                    "annotations": {
                        "bold": false, "italic": false, "strikethrough": false,
                        "underline": false, "code": false, "color": "default"
                    },
                    "plain_text": text,
                    "href": null
                }],
                "color": "default"
            }
        })
    }

    #[test]
    fn test_paragraph_converts() {
        let block = convert_raw_block(paragraph_json(
            "c02fc1d3-db8b-45c5-a222-27595b15aea7",
            "Hello",
        ))
        .unwrap()
        .unwrap();

        match &block {
            Block::Paragraph(p) => {
                assert_eq!(p.content.rich_text[0].plain_text, "Hello");
                assert_eq!(p.common.id.as_str(), "c02fc1d3db8b45c5a22227595b15aea7");
            }
            other => panic!("expected paragraph, got {}", other.block_type()),
        }
    }

    #[test]
    fn test_partial_block_is_skipped() {
        let partial = json!({ "object": "block", "id": "c02fc1d3db8b45c5a22227595b15aea7" });
        assert!(convert_raw_block(partial).unwrap().is_none());
    }

    #[test]
    fn test_unknown_type_is_kept_as_unsupported() {
        let unknown = json!({
            "object": "block",
            "id": "c02fc1d3db8b45c5a22227595b15aea7",
            "type": "brand_new_widget",
            "has_children": true,
            "brand_new_widget": { "anything": 1 }
        });

        let block = convert_raw_block(unknown).unwrap().unwrap();
        assert_eq!(block.block_type(), "brand_new_widget");
        assert!(block.has_children());
    }
}
