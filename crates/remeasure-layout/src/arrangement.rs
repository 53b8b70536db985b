//! Main-axis distribution of children for [`LinearPolicy`](crate::LinearPolicy).

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum LinearArrangement {
    #[default]
    Start,
    End,
    Center,
    /// Free space goes between children only.
    SpaceBetween,
    /// Free space is split per child, half on each side.
    SpaceAround,
    /// Equal gaps at both edges and between children.
    SpaceEvenly,
    SpacedBy(f32),
}

impl LinearArrangement {
    pub fn spaced_by(spacing: f32) -> Self {
        Self::SpacedBy(spacing)
    }

    /// Main-axis space the arrangement consumes regardless of the container
    /// size.
    pub fn fixed_spacing(&self) -> f32 {
        match *self {
            LinearArrangement::SpacedBy(spacing) => spacing,
            _ => 0.0,
        }
    }

    /// Offset of the first child and the gap after every child but the last.
    fn leading_and_gap(&self, free: f32, count: usize) -> (f32, f32) {
        let count = count as f32;
        match *self {
            LinearArrangement::Start => (0.0, 0.0),
            LinearArrangement::End => (free, 0.0),
            LinearArrangement::Center => (free / 2.0, 0.0),
            LinearArrangement::SpaceBetween if count > 1.0 => (0.0, free / (count - 1.0)),
            LinearArrangement::SpaceBetween => (0.0, 0.0),
            LinearArrangement::SpaceAround => {
                let gap = free / count;
                (gap / 2.0, gap)
            }
            LinearArrangement::SpaceEvenly => {
                let gap = free / (count + 1.0);
                (gap, gap)
            }
            LinearArrangement::SpacedBy(spacing) => (0.0, spacing),
        }
    }

    /// Writes the main-axis offset of every child into `out_positions`.
    pub fn arrange(&self, total_size: f32, sizes: &[f32], out_positions: &mut [f32]) {
        debug_assert_eq!(sizes.len(), out_positions.len());
        if sizes.is_empty() {
            return;
        }
        let free = total_size - sizes.iter().sum::<f32>();
        let (mut cursor, gap) = self.leading_and_gap(free, sizes.len());
        for (position, size) in out_positions.iter_mut().zip(sizes) {
            *position = cursor;
            cursor += size + gap;
        }
    }

    /// Like [`arrange`](Self::arrange), mirrored when `reverse` is set
    /// (rows in right-to-left layouts).
    pub fn arrange_directional(
        &self,
        total_size: f32,
        sizes: &[f32],
        out_positions: &mut [f32],
        reverse: bool,
    ) {
        self.arrange(total_size, sizes, out_positions);
        if reverse {
            for (position, size) in out_positions.iter_mut().zip(sizes) {
                *position = total_size - *position - size;
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/arrangement_tests.rs"]
mod tests;
