//! Outline embedding for PDF artifacts built on top of `lopdf`.

use std::collections::BTreeMap;

use log::{info, warn};
use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};

use crate::destination::Destination;
use crate::error::{OutlineError, Result};
use crate::layout::{LayoutBox, LayoutQuery, PageGeometry, PagedLayout};
use crate::model::{Bookmarks, SourcePosition};
use crate::outline::{self, OutlineSink};

/// Device units per point used by [`NamedDestinationLayout`].
pub const DOTS_PER_POINT: f32 = 20.0;

/// Height assumed for pages without a usable `/MediaBox` (A4).
pub const DEFAULT_PAGE_HEIGHT: f32 = 842.0;

/// Embeds `bookmarks` as the document outline of the PDF in `pdf_bytes`.
///
/// Destinations are resolved through `layout`.  When the forest is empty the
/// input bytes are returned unchanged.
pub fn apply_bookmarks<L>(pdf_bytes: &[u8], bookmarks: &Bookmarks, layout: &L) -> Result<Vec<u8>>
where
    L: LayoutQuery + ?Sized,
{
    if bookmarks.is_empty() {
        info!("No bookmarks to render");
        return Ok(pdf_bytes.to_vec());
    }

    let mut document = Document::load_mem(pdf_bytes)?;
    write_bookmarks(&mut document, bookmarks, layout)?;

    let mut buffer = Vec::new();
    document.save_to(&mut buffer)?;
    Ok(buffer)
}

/// Writes `bookmarks` into an already loaded document.
///
/// Returns the identifier of the `/Outlines` dictionary, if one was created.
pub fn write_bookmarks<L>(
    document: &mut Document,
    bookmarks: &Bookmarks,
    layout: &L,
) -> Result<Option<ObjectId>>
where
    L: LayoutQuery + ?Sized,
{
    let mut sink = PdfOutlineSink::new();
    outline::write_outline(bookmarks, layout, &mut sink);
    sink.finish(document)
}

struct OutlineEntry {
    title: String,
    destination: Destination,
    children: Vec<usize>,
}

/// [`OutlineSink`] collecting entries for a `lopdf` document.
///
/// Entries are buffered until [`PdfOutlineSink::finish`] knows the page
/// references and object identifiers of the target document.
#[derive(Default)]
pub struct PdfOutlineSink {
    entries: Vec<OutlineEntry>,
    roots: Vec<usize>,
    use_outlines: bool,
}

impl OutlineSink for PdfOutlineSink {
    type Entry = usize;

    fn add_entry(
        &mut self,
        parent: Option<usize>,
        title: &str,
        destination: &Destination,
    ) -> usize {
        let index = self.entries.len();
        self.entries.push(OutlineEntry {
            title: title.to_string(),
            destination: *destination,
            children: Vec::new(),
        });
        match parent {
            Some(parent) => self.entries[parent].children.push(index),
            None => self.roots.push(index),
        }
        index
    }

    fn use_outlines(&mut self) {
        self.use_outlines = true;
    }
}

impl PdfOutlineSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of buffered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Indicates whether no entry was added.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the buffered outline into `document`.
    ///
    /// Returns the identifier of the `/Outlines` dictionary, or `None` when no
    /// entry was added.
    pub fn finish(self, document: &mut Document) -> Result<Option<ObjectId>> {
        if self.roots.is_empty() {
            return Ok(None);
        }

        let catalog_id = catalog_id(document)?;
        let pages = document.get_pages();
        let object_ids: Vec<ObjectId> = self
            .entries
            .iter()
            .map(|_| document.new_object_id())
            .collect();
        let outlines_id = document.new_object_id();

        let context = LinkContext {
            entries: &self.entries,
            object_ids: &object_ids,
            pages: &pages,
            visible: visible_counts(&self.entries),
        };
        context.link_siblings(document, outlines_id, &self.roots);
        for (index, entry) in self.entries.iter().enumerate() {
            context.link_siblings(document, object_ids[index], &entry.children);
        }

        let mut dictionary = Dictionary::new();
        dictionary.set("Type", Object::Name(b"Outlines".to_vec()));
        dictionary.set("Count", Object::Integer(context.visible_in(&self.roots)));
        set_first_last(&mut dictionary, &self.roots, &object_ids);
        document
            .objects
            .insert(outlines_id, Object::Dictionary(dictionary));

        let catalog = catalog_dict(document, catalog_id)?;
        catalog.set("Outlines", Object::Reference(outlines_id));
        if self.use_outlines {
            catalog.set("PageMode", Object::Name(b"UseOutlines".to_vec()));
        }

        Ok(Some(outlines_id))
    }
}

/// Number of descendants each entry shows while its ancestors are open.
fn visible_counts(entries: &[OutlineEntry]) -> Vec<i64> {
    let mut visible = vec![0; entries.len()];
    // Children are always added after their parent, so a reverse sweep sees
    // every child before its parent.
    for index in (0..entries.len()).rev() {
        let count: i64 = entries[index]
            .children
            .iter()
            .map(|child| 1 + visible[*child])
            .sum();
        visible[index] = count;
    }
    visible
}

struct LinkContext<'a> {
    entries: &'a [OutlineEntry],
    object_ids: &'a [ObjectId],
    pages: &'a BTreeMap<u32, ObjectId>,
    visible: Vec<i64>,
}

impl LinkContext<'_> {
    /// Writes the dictionaries of one sibling list under `parent_id`.
    fn link_siblings(&self, document: &mut Document, parent_id: ObjectId, siblings: &[usize]) {
        for (position, index) in siblings.iter().enumerate() {
            let entry = &self.entries[*index];
            let mut dictionary = Dictionary::new();
            dictionary.set("Title", text_string(&entry.title));
            dictionary.set("Parent", Object::Reference(parent_id));
            if let Some(destination) = self.destination(&entry.destination) {
                dictionary.set("Dest", destination);
            }

            if position > 0 {
                dictionary.set(
                    "Prev",
                    Object::Reference(self.object_ids[siblings[position - 1]]),
                );
            }
            if let Some(next) = siblings.get(position + 1) {
                dictionary.set("Next", Object::Reference(self.object_ids[*next]));
            }

            if !entry.children.is_empty() {
                set_first_last(&mut dictionary, &entry.children, self.object_ids);
                dictionary.set("Count", Object::Integer(self.visible[*index]));
            }

            document
                .objects
                .insert(self.object_ids[*index], Object::Dictionary(dictionary));
        }
    }

    /// Entries made visible by an open list of `siblings`.
    fn visible_in(&self, siblings: &[usize]) -> i64 {
        siblings.iter().map(|index| 1 + self.visible[*index]).sum()
    }

    fn destination(&self, destination: &Destination) -> Option<Object> {
        if let Destination::Xyz { page_index, top } = *destination {
            match self.page(page_index) {
                Some(page) => {
                    return Some(Object::Array(vec![
                        Object::Reference(page),
                        Object::Name(b"XYZ".to_vec()),
                        Object::Integer(0),
                        Object::Real(top),
                        Object::Integer(0),
                    ]))
                }
                None => warn!("Bookmark refers to missing page {page_index}, fitting first page"),
            }
        }

        let first = self.page(0)?;
        Some(Object::Array(vec![
            Object::Reference(first),
            Object::Name(b"FitH".to_vec()),
            Object::Null,
        ]))
    }

    fn page(&self, page_index: usize) -> Option<ObjectId> {
        let page_number = u32::try_from(page_index + 1).ok()?;
        self.pages.get(&page_number).copied()
    }
}

fn set_first_last(dictionary: &mut Dictionary, level: &[usize], object_ids: &[ObjectId]) {
    if let Some(first) = level.first() {
        dictionary.set("First", Object::Reference(object_ids[*first]));
    }
    if let Some(last) = level.last() {
        dictionary.set("Last", Object::Reference(object_ids[*last]));
    }
}

fn catalog(document: &Document) -> Option<&Dictionary> {
    let catalog_id = document
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .ok()?;
    document.get_object(catalog_id).and_then(Object::as_dict).ok()
}

fn catalog_id(document: &Document) -> Result<ObjectId> {
    let catalog_id = document
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| OutlineError::MissingCatalog)?;

    match document.objects.get(&catalog_id) {
        Some(Object::Dictionary(_)) => Ok(catalog_id),
        Some(_) => Err(OutlineError::InvalidCatalog),
        None => Err(OutlineError::MissingCatalog),
    }
}

fn catalog_dict(document: &mut Document, catalog_id: ObjectId) -> Result<&mut Dictionary> {
    document
        .objects
        .get_mut(&catalog_id)
        .ok_or(OutlineError::MissingCatalog)?
        .as_dict_mut()
        .map_err(|_| OutlineError::InvalidCatalog)
}

/// Encodes `text` as a PDF text string.
///
/// ASCII titles are written as literal strings, anything else as UTF-16BE
/// with a byte order mark.
pub fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::String(text.as_bytes().to_vec(), StringFormat::Literal);
    }

    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// A [`LayoutQuery`] over the named destinations of a rendered PDF.
///
/// Renderers commonly emit one named destination per element identifier.
/// Pages are stacked vertically by their `/MediaBox` heights, and every named
/// destination becomes a block box at its `top` coordinate, so resolving an
/// anchor reproduces the page and offset of the named destination.
#[derive(Clone, Debug)]
pub struct NamedDestinationLayout {
    layout: PagedLayout,
}

impl NamedDestinationLayout {
    /// Reads page geometry and named destinations from `document`.
    pub fn from_document(document: &Document) -> Self {
        let mut layout = PagedLayout::new(DOTS_PER_POINT);
        let mut page_tops = BTreeMap::new();

        for page_id in document.get_pages().into_values() {
            let height = page_height(document, page_id);
            let page = layout.push_page(to_dots(height), 0);
            page_tops.insert(page_id, (page.top(), height));
        }

        for (name, target) in named_destinations(document) {
            let Some((page_id, top)) = destination_target(document, target) else {
                continue;
            };
            let Some((page_top, height)) = page_tops.get(&page_id).copied() else {
                continue;
            };
            let offset = height - top.unwrap_or(height).clamp(0.0, height);
            layout.insert_box(name, LayoutBox::block(page_top + to_dots(offset)));
        }

        Self { layout }
    }

    /// Loads `pdf_bytes` and reads its named destinations.
    pub fn from_bytes(pdf_bytes: &[u8]) -> Result<Self> {
        let document = Document::load_mem(pdf_bytes)?;
        Ok(Self::from_document(&document))
    }
}

impl LayoutQuery for NamedDestinationLayout {
    fn box_by_id(&self, id: &str) -> Option<&LayoutBox> {
        self.layout.box_by_id(id)
    }

    fn box_at(&self, position: SourcePosition) -> Option<&LayoutBox> {
        self.layout.box_at(position)
    }

    fn page_containing(&self, y: i32) -> Option<&PageGeometry> {
        self.layout.page_containing(y)
    }

    fn dots_per_point(&self) -> f32 {
        self.layout.dots_per_point()
    }
}

fn to_dots(points: f32) -> i32 {
    (points * DOTS_PER_POINT).round() as i32
}

fn resolve<'a>(document: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => document.get_object(*id).ok(),
        other => Some(other),
    }
}

fn page_height(document: &Document, page_id: ObjectId) -> f32 {
    let mut current = Some(page_id);
    // Guards against cyclic /Parent chains.
    for _ in 0..32 {
        let Some(dictionary) = current
            .and_then(|id| document.get_object(id).ok())
            .and_then(|object| object.as_dict().ok())
        else {
            break;
        };
        if let Some(height) = dictionary
            .get(b"MediaBox")
            .ok()
            .and_then(|object| resolve(document, object))
            .and_then(media_box_height)
        {
            return height;
        }
        current = dictionary
            .get(b"Parent")
            .and_then(Object::as_reference)
            .ok();
    }
    DEFAULT_PAGE_HEIGHT
}

fn media_box_height(object: &Object) -> Option<f32> {
    let values = object.as_array().ok()?;
    let bottom = values.get(1)?.as_float().ok()?;
    let top = values.get(3)?.as_float().ok()?;
    Some((top - bottom).abs())
}

fn named_destinations(document: &Document) -> Vec<(String, &Object)> {
    let mut names = Vec::new();
    let Some(catalog) = catalog(document) else {
        return names;
    };

    if let Some(dests) = catalog
        .get(b"Dests")
        .ok()
        .and_then(|object| resolve(document, object))
        .and_then(|object| object.as_dict().ok())
    {
        for (key, value) in dests.iter() {
            names.push((String::from_utf8_lossy(key).into_owned(), value));
        }
    }

    if let Some(tree) = catalog
        .get(b"Names")
        .ok()
        .and_then(|object| resolve(document, object))
        .and_then(|object| object.as_dict().ok())
        .and_then(|names_dict| names_dict.get(b"Dests").ok())
        .and_then(|object| resolve(document, object))
    {
        collect_name_tree(document, tree, &mut names, 0);
    }

    names
}

fn collect_name_tree<'a>(
    document: &'a Document,
    node: &'a Object,
    names: &mut Vec<(String, &'a Object)>,
    depth: usize,
) {
    if depth > 32 {
        return;
    }
    let Ok(dictionary) = node.as_dict() else {
        return;
    };

    if let Some(pairs) = dictionary
        .get(b"Names")
        .ok()
        .and_then(|object| resolve(document, object))
        .and_then(|object| object.as_array().ok())
    {
        for pair in pairs.chunks(2) {
            if let [Object::String(key, _), value] = pair {
                names.push((String::from_utf8_lossy(key).into_owned(), value));
            }
        }
    }

    if let Some(kids) = dictionary
        .get(b"Kids")
        .ok()
        .and_then(|object| resolve(document, object))
        .and_then(|object| object.as_array().ok())
    {
        for kid in kids {
            if let Some(kid) = resolve(document, kid) {
                collect_name_tree(document, kid, names, depth + 1);
            }
        }
    }
}

/// Extracts the page and optional top coordinate of an explicit destination.
fn destination_target(document: &Document, target: &Object) -> Option<(ObjectId, Option<f32>)> {
    let target = resolve(document, target)?;
    let array = match target {
        Object::Dictionary(dictionary) => resolve(document, dictionary.get(b"D").ok()?)?,
        other => other,
    }
    .as_array()
    .ok()?;

    let page_id = array.first()?.as_reference().ok()?;
    let kind = array.get(1)?.as_name().ok()?;
    let top_index = match kind {
        b"XYZ" => Some(3),
        b"FitH" | b"FitBH" => Some(2),
        b"FitR" => Some(5),
        _ => None,
    };
    let top = top_index
        .and_then(|index| array.get(index))
        .and_then(|value| value.as_float().ok());
    Some((page_id, top))
}
