//! Dense row-major grid shared by every generation tier

use serde::{Deserialize, Serialize};

use crate::core::types::GridPos;

/// Generic 2D tile grid addressed by `(x, y)`
///
/// Deserializing checks that `data` holds exactly `width * height` cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGrid<T>")]
pub struct TileGrid<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

/// Unchecked wire form of a grid
#[derive(Deserialize)]
struct RawGrid<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T> TryFrom<RawGrid<T>> for TileGrid<T> {
    type Error = String;

    fn try_from(raw: RawGrid<T>) -> Result<Self, Self::Error> {
        let expected = raw
            .width
            .checked_mul(raw.height)
            .ok_or_else(|| format!("grid {}x{} is too large", raw.width, raw.height))?;
        if raw.data.len() != expected {
            return Err(format!(
                "grid {}x{} holds {} cells, expected {expected}",
                raw.width,
                raw.height,
                raw.data.len()
            ));
        }
        Ok(Self {
            width: raw.width,
            height: raw.height,
            data: raw.data,
        })
    }
}

impl<T: Clone + Default> TileGrid<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, T::default())
    }
}

impl<T: Clone> TileGrid<T> {
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }
}

impl<T> TileGrid<T> {
    /// Build a grid by evaluating `f(x, y)` in row-major order
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self { width, height, data }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x < self.width && y < self.height {
            Some(&self.data[y * self.width + x])
        } else {
            None
        }
    }

    #[inline]
    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut T> {
        if x < self.width && y < self.height {
            Some(&mut self.data[y * self.width + x])
        } else {
            None
        }
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = value;
        }
    }

    /// Signed lookup; negative or out-of-range positions yield `None`
    #[inline]
    pub fn at(&self, pos: GridPos) -> Option<&T> {
        if self.in_bounds(pos) {
            self.get(pos.x as usize, pos.y as usize)
        } else {
            None
        }
    }

    #[inline]
    pub fn at_mut(&mut self, pos: GridPos) -> Option<&mut T> {
        if self.in_bounds(pos) {
            self.get_mut(pos.x as usize, pos.y as usize)
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.data.iter_mut()
    }

    /// Iterate cells with their coordinates
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let width = self.width;
        self.data
            .iter()
            .enumerate()
            .map(move |(i, cell)| (i % width, i / width, cell))
    }
}
