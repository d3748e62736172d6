//! 2D objects: interval domains, grey value tables, polygons and boundary lists

use crate::error::{Error, Result};
use crate::point::{nint, Point2d, Point2i};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Inclusive run of columns on one line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub left: i32,
    pub right: i32,
}

impl Interval {
    pub fn new(left: i32, right: i32) -> Self {
        Self { left, right }
    }

    /// Number of pixels in the interval
    pub fn len(&self) -> usize {
        (self.right - self.left + 1).max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.right < self.left
    }
}

/// Integer bounding box, all bounds inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox2i {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl BoundingBox2i {
    pub fn width(&self) -> usize {
        (self.x_max - self.x_min + 1).max(0) as usize
    }

    pub fn height(&self) -> usize {
        (self.y_max - self.y_min + 1).max(0) as usize
    }

    /// Grow the box by `d` on every side
    pub fn dilated(&self, d: i32) -> Self {
        Self {
            x_min: self.x_min - d,
            y_min: self.y_min - d,
            x_max: self.x_max + d,
            y_max: self.y_max + d,
        }
    }
}

/// A 2D spatial domain stored as sorted, non-overlapping intervals per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalDomain {
    line1: i32,
    lines: Vec<Vec<Interval>>,
}

impl IntervalDomain {
    /// A domain with no pixels
    pub fn empty() -> Self {
        Self {
            line1: 0,
            lines: Vec::new(),
        }
    }

    /// Rectangular domain covering `[x_min, x_max] x [y_min, y_max]`
    pub fn from_rect(x_min: i32, y_min: i32, x_max: i32, y_max: i32) -> Self {
        if x_max < x_min || y_max < y_min {
            return Self::empty();
        }
        let lines = (y_min..=y_max)
            .map(|_| vec![Interval::new(x_min, x_max)])
            .collect();
        Self {
            line1: y_min,
            lines,
        }
    }

    /// Build from explicit per-line intervals starting at `line1`.
    ///
    /// Intervals on each line must be non-empty, sorted and separated by at
    /// least one column.
    pub fn from_lines(line1: i32, lines: Vec<Vec<Interval>>) -> Result<Self> {
        for (offset, itvs) in lines.iter().enumerate() {
            let mut prev_right: Option<i32> = None;
            for itv in itvs {
                if itv.is_empty() {
                    return Err(Error::DomainData(format!(
                        "Empty interval on line {}",
                        line1 + offset as i32
                    )));
                }
                if let Some(r) = prev_right {
                    if itv.left <= r + 1 {
                        return Err(Error::DomainData(format!(
                            "Unsorted or touching intervals on line {}",
                            line1 + offset as i32
                        )));
                    }
                }
                prev_right = Some(itv.right);
            }
        }
        let mut domain = Self { line1, lines };
        domain.trim();
        Ok(domain)
    }

    /// Build from a mask whose element `[[row, col]]` is pixel
    /// `(origin.x + col, origin.y + row)`.
    pub fn from_mask(origin: Point2i, mask: &Array2<bool>) -> Self {
        let lines = mask
            .rows()
            .into_iter()
            .map(|row| {
                let mut itvs = Vec::new();
                let mut start: Option<i32> = None;
                for (col, &set) in row.iter().enumerate() {
                    let x = origin.x + col as i32;
                    match (set, start) {
                        (true, None) => start = Some(x),
                        (false, Some(s)) => {
                            itvs.push(Interval::new(s, x - 1));
                            start = None;
                        }
                        _ => {}
                    }
                }
                if let Some(s) = start {
                    itvs.push(Interval::new(s, origin.x + row.len() as i32 - 1));
                }
                itvs
            })
            .collect();
        let mut domain = Self {
            line1: origin.y,
            lines,
        };
        domain.trim();
        domain
    }

    fn trim(&mut self) {
        let lead = self.lines.iter().take_while(|l| l.is_empty()).count();
        if lead == self.lines.len() {
            *self = Self::empty();
            return;
        }
        let trail = self.lines.iter().rev().take_while(|l| l.is_empty()).count();
        self.lines.truncate(self.lines.len() - trail);
        self.lines.drain(..lead);
        self.line1 += lead as i32;
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.is_empty())
    }

    /// First line of the domain
    pub fn line1(&self) -> i32 {
        self.line1
    }

    /// Last line of the domain
    pub fn last_line(&self) -> i32 {
        self.line1 + self.lines.len() as i32 - 1
    }

    /// Intervals on line `y`, empty outside the domain
    pub fn line(&self, y: i32) -> &[Interval] {
        if y < self.line1 {
            return &[];
        }
        self.lines
            .get((y - self.line1) as usize)
            .map(|l| l.as_slice())
            .unwrap_or(&[])
    }

    pub fn bounding_box(&self) -> Option<BoundingBox2i> {
        if self.is_empty() {
            return None;
        }
        let x_min = self.lines.iter().filter_map(|l| l.first()).map(|i| i.left).min()?;
        let x_max = self.lines.iter().filter_map(|l| l.last()).map(|i| i.right).max()?;
        Some(BoundingBox2i {
            x_min,
            y_min: self.line1,
            x_max,
            y_max: self.last_line(),
        })
    }

    /// Iterate `(line, interval)` in raster order
    pub fn intervals(&self) -> impl Iterator<Item = (i32, Interval)> + '_ {
        self.lines.iter().enumerate().flat_map(move |(offset, itvs)| {
            let y = self.line1 + offset as i32;
            itvs.iter().map(move |itv| (y, *itv))
        })
    }

    /// Iterate every pixel in raster order
    pub fn pixels(&self) -> impl Iterator<Item = Point2i> + '_ {
        self.intervals()
            .flat_map(|(y, itv)| (itv.left..=itv.right).map(move |x| Point2i::new(x, y)))
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.line(y)
            .binary_search_by(|itv| {
                if itv.right < x {
                    std::cmp::Ordering::Less
                } else if itv.left > x {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    /// Number of pixels in the domain
    pub fn area(&self) -> usize {
        self.intervals().map(|(_, itv)| itv.len()).sum()
    }
}

/// Grey value types a value table can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GreyType {
    Int,
    Short,
    UByte,
    Float,
    Double,
    Rgba,
}

/// A single grey value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GreyValue {
    Int(i32),
    Short(i16),
    UByte(u8),
    Float(f32),
    Double(f64),
    Rgba(u32),
}

impl GreyValue {
    pub fn grey_type(&self) -> GreyType {
        match self {
            GreyValue::Int(_) => GreyType::Int,
            GreyValue::Short(_) => GreyType::Short,
            GreyValue::UByte(_) => GreyType::UByte,
            GreyValue::Float(_) => GreyType::Float,
            GreyValue::Double(_) => GreyType::Double,
            GreyValue::Rgba(_) => GreyType::Rgba,
        }
    }

    /// Scalar value, `None` for RGBA
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            GreyValue::Int(v) => Some(v as f64),
            GreyValue::Short(v) => Some(v as f64),
            GreyValue::UByte(v) => Some(v as f64),
            GreyValue::Float(v) => Some(v as f64),
            GreyValue::Double(v) => Some(v),
            GreyValue::Rgba(_) => None,
        }
    }
}

/// Scalar pixel types that can be resampled.
pub trait GreyPixel: Copy + Default + PartialEq + Send + Sync + 'static {
    fn to_f64(self) -> f64;

    /// Convert an interpolated value back to the pixel type
    fn from_interpolated(v: f64) -> Self;
}

impl GreyPixel for i32 {
    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_interpolated(v: f64) -> Self {
        nint(v)
    }
}

impl GreyPixel for i16 {
    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_interpolated(v: f64) -> Self {
        nint(v).clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
    }
}

impl GreyPixel for u8 {
    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_interpolated(v: f64) -> Self {
        nint(v).clamp(0, 255) as u8
    }
}

impl GreyPixel for f32 {
    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_interpolated(v: f64) -> Self {
        v as f32
    }
}

impl GreyPixel for f64 {
    fn to_f64(self) -> f64 {
        self
    }

    fn from_interpolated(v: f64) -> Self {
        v
    }
}

/// Rectangular raster of grey values, element `[[row, col]]` is pixel
/// `(origin.x + col, origin.y + row)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GreyRaster {
    Int(Array2<i32>),
    Short(Array2<i16>),
    UByte(Array2<u8>),
    Float(Array2<f32>),
    Double(Array2<f64>),
    Rgba(Array2<u32>),
}

impl GreyRaster {
    pub fn grey_type(&self) -> GreyType {
        match self {
            GreyRaster::Int(_) => GreyType::Int,
            GreyRaster::Short(_) => GreyType::Short,
            GreyRaster::UByte(_) => GreyType::UByte,
            GreyRaster::Float(_) => GreyType::Float,
            GreyRaster::Double(_) => GreyType::Double,
            GreyRaster::Rgba(_) => GreyType::Rgba,
        }
    }

    /// `(rows, cols)`
    pub fn dim(&self) -> (usize, usize) {
        match self {
            GreyRaster::Int(a) => a.dim(),
            GreyRaster::Short(a) => a.dim(),
            GreyRaster::UByte(a) => a.dim(),
            GreyRaster::Float(a) => a.dim(),
            GreyRaster::Double(a) => a.dim(),
            GreyRaster::Rgba(a) => a.dim(),
        }
    }

    fn get(&self, row: usize, col: usize) -> Option<GreyValue> {
        let idx = [row, col];
        match self {
            GreyRaster::Int(a) => a.get(idx).map(|v| GreyValue::Int(*v)),
            GreyRaster::Short(a) => a.get(idx).map(|v| GreyValue::Short(*v)),
            GreyRaster::UByte(a) => a.get(idx).map(|v| GreyValue::UByte(*v)),
            GreyRaster::Float(a) => a.get(idx).map(|v| GreyValue::Float(*v)),
            GreyRaster::Double(a) => a.get(idx).map(|v| GreyValue::Double(*v)),
            GreyRaster::Rgba(a) => a.get(idx).map(|v| GreyValue::Rgba(*v)),
        }
    }
}

/// Grey values for a domain: a raster anchored at `origin` plus the value
/// reported for pixels the raster does not cover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueTable {
    origin: Point2i,
    raster: GreyRaster,
    background: GreyValue,
}

impl ValueTable {
    pub fn new(origin: Point2i, raster: GreyRaster, background: GreyValue) -> Result<Self> {
        if raster.grey_type() != background.grey_type() {
            return Err(Error::GreyType(format!(
                "Background {:?} does not match raster {:?}",
                background.grey_type(),
                raster.grey_type()
            )));
        }
        Ok(Self {
            origin,
            raster,
            background,
        })
    }

    pub fn origin(&self) -> Point2i {
        self.origin
    }

    pub fn raster(&self) -> &GreyRaster {
        &self.raster
    }

    pub fn background(&self) -> GreyValue {
        self.background
    }

    pub fn grey_type(&self) -> GreyType {
        self.raster.grey_type()
    }

    /// Value at pixel `(x, y)`, the background outside the raster
    pub fn get(&self, x: i32, y: i32) -> GreyValue {
        let col = x - self.origin.x;
        let row = y - self.origin.y;
        if col < 0 || row < 0 {
            return self.background;
        }
        self.raster
            .get(row as usize, col as usize)
            .unwrap_or(self.background)
    }
}

/// A domain with optional grey values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainObject {
    pub domain: IntervalDomain,
    pub values: Option<ValueTable>,
}

impl DomainObject {
    pub fn new(domain: IntervalDomain, values: Option<ValueTable>) -> Self {
        Self { domain, values }
    }

    /// Grey value at `(x, y)`, the background for pixels outside the domain.
    /// `None` when the object has no values.
    pub fn grey_at(&self, x: i32, y: i32) -> Option<GreyValue> {
        self.values.as_ref().map(|v| {
            if self.domain.contains(x, y) {
                v.get(x, y)
            } else {
                v.background()
            }
        })
    }
}

/// Coordinate type a polygon's vertices are kept in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VertexKind {
    Int,
    Float,
    Double,
}

/// Polygon vertex list; `Int` polygons hold integral coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonDomain {
    pub kind: VertexKind,
    pub vertices: Vec<Point2d>,
}

impl PolygonDomain {
    pub fn new(kind: VertexKind, vertices: Vec<Point2d>) -> Self {
        Self { kind, vertices }
    }

    /// Polygon with integral vertices
    pub fn from_int(vertices: &[Point2i]) -> Self {
        Self {
            kind: VertexKind::Int,
            vertices: vertices
                .iter()
                .map(|v| Point2d::new(v.x as f64, v.y as f64))
                .collect(),
        }
    }
}

/// Whether a boundary is an outer piece or a hole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundKind {
    Piece,
    Hole,
}

/// Tree of boundary polygons: `next` links siblings, `down` links the
/// boundaries nested inside this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundList {
    pub kind: BoundKind,
    pub wrap: usize,
    pub polygon: Option<PolygonDomain>,
    pub next: Option<Box<BoundList>>,
    pub down: Option<Box<BoundList>>,
}

impl BoundList {
    pub fn new(kind: BoundKind, polygon: PolygonDomain) -> Self {
        Self {
            kind,
            wrap: 1,
            polygon: Some(polygon),
            next: None,
            down: None,
        }
    }
}

/// Objects the mesh transform can be applied to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Object {
    Empty,
    Domain2D(DomainObject),
    Polygon(PolygonDomain),
    Boundary(BoundList),
}

impl Object {
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Empty => "empty",
            Object::Domain2D(_) => "2D domain",
            Object::Polygon(_) => "2D polygon",
            Object::Boundary(_) => "boundary list",
        }
    }

    /// The domain object, or `ObjectType` for anything else
    pub fn as_domain_2d(&self) -> Result<&DomainObject> {
        match self {
            Object::Domain2D(obj) => Ok(obj),
            other => Err(Error::ObjectType(format!(
                "Expected a 2D domain object, got {}",
                other.type_name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_rect_domain() {
        let d = IntervalDomain::from_rect(2, 3, 5, 4);
        assert_eq!(d.area(), 8);
        assert_eq!(
            d.bounding_box().unwrap(),
            BoundingBox2i {
                x_min: 2,
                y_min: 3,
                x_max: 5,
                y_max: 4
            }
        );
        assert!(d.contains(2, 3));
        assert!(!d.contains(6, 3));
        assert!(!d.contains(2, 5));
    }

    #[test]
    fn test_mask_domain_trims_and_splits() {
        let mask = array![
            [false, false, false, false],
            [true, true, false, true],
            [false, true, true, false],
        ];
        let d = IntervalDomain::from_mask(Point2i::new(10, 20), &mask);
        assert_eq!(d.line1(), 21);
        assert_eq!(d.last_line(), 22);
        assert_eq!(d.line(21), &[Interval::new(10, 11), Interval::new(13, 13)]);
        assert_eq!(d.line(22), &[Interval::new(11, 12)]);
        assert_eq!(d.area(), 5);
        assert_eq!(d.pixels().count(), 5);
    }

    #[test]
    fn test_from_lines_rejects_overlap() {
        let lines = vec![vec![Interval::new(0, 4), Interval::new(3, 8)]];
        assert!(matches!(
            IntervalDomain::from_lines(0, lines),
            Err(Error::DomainData(_))
        ));
    }

    #[test]
    fn test_value_table_background_outside_raster() {
        let raster = GreyRaster::UByte(array![[1u8, 2], [3, 4]]);
        let vt = ValueTable::new(Point2i::new(5, 5), raster, GreyValue::UByte(9)).unwrap();
        assert_eq!(vt.get(6, 6), GreyValue::UByte(4));
        assert_eq!(vt.get(4, 5), GreyValue::UByte(9));
        assert_eq!(vt.get(7, 5), GreyValue::UByte(9));
    }

    #[test]
    fn test_value_table_type_mismatch() {
        let raster = GreyRaster::Int(array![[1]]);
        assert!(matches!(
            ValueTable::new(Point2i::new(0, 0), raster, GreyValue::UByte(0)),
            Err(Error::GreyType(_))
        ));
    }

    #[test]
    fn test_grey_pixel_conversions() {
        assert_eq!(u8::from_interpolated(300.2), 255);
        assert_eq!(u8::from_interpolated(-3.0), 0);
        assert_eq!(i32::from_interpolated(-1.5), -2);
        assert_eq!(i16::from_interpolated(7.49), 7);
        assert_eq!(i16::from_interpolated(40000.0), i16::MAX);
        assert_eq!(i16::from_interpolated(-40000.6), i16::MIN);
        assert_eq!(f32::from_interpolated(1.25), 1.25);
    }
}
