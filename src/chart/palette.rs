use crate::sampler::Pid;
use std::collections::{HashMap, VecDeque};

/// 24-bit colour, independent of any terminal library.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

// colorbrewer2.org qualitative/diverging picks
const QUALITATIVE: [Rgb; 15] = [
    Rgb(0x9e, 0x01, 0x42),
    Rgb(0xd5, 0x3e, 0x4f),
    Rgb(0xfd, 0xae, 0x61),
    Rgb(0xfe, 0xe0, 0x8b),
    Rgb(0x66, 0xc2, 0xa5),
    Rgb(0x32, 0x88, 0xbd),
    Rgb(0x5e, 0x4f, 0xa2),
    Rgb(0x6e, 0x5f, 0xb2),
    Rgb(0x7f, 0x3b, 0x08),
    Rgb(0xff, 0xff, 0xff),
    Rgb(0x80, 0x73, 0xac),
    Rgb(0x54, 0x27, 0x88),
    Rgb(0xa6, 0xce, 0xe3),
    Rgb(0x33, 0xa0, 0x2c),
    Rgb(0xb2, 0xdf, 0x8a),
];

/// Fixed, ordered set of series colours.
#[derive(Debug, Clone)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Palette {
    pub fn qualitative() -> Self {
        Palette {
            colors: QUALITATIVE.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Colour for a rank slot; slots past the end wrap around.
    pub fn cycle(&self, slot: usize) -> Rgb {
        self.colors[slot % self.colors.len()]
    }
}

/// Colour picked for one ranked pid on one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Assigned {
    pub rank: usize,
    pub pid: Pid,
    pub key: String,
    pub color: Rgb,
}

/// Rank-ordered colours shared by the process list and process chart.
#[derive(Debug, Clone, Default)]
pub struct ColorAssignment {
    entries: Vec<Assigned>,
}

impl ColorAssignment {
    fn push(&mut self, rank: usize, pid: Pid, color: Rgb) {
        self.entries.push(Assigned {
            rank,
            pid,
            key: pid.to_string(),
            color,
        });
    }

    pub fn entries(&self) -> &[Assigned] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Strategy for mapping the ranking onto the palette.
#[derive(Debug)]
pub enum ColorAssigner {
    /// `palette[rank % K]`, recomputed every tick.
    Rank,
    /// Pid keeps its colour while ranked; released colours are reused
    /// least-recently-released first.
    Sticky {
        held: HashMap<Pid, usize>,
        free: VecDeque<usize>,
    },
}

impl ColorAssigner {
    pub fn rank() -> Self {
        ColorAssigner::Rank
    }

    pub fn sticky(palette: &Palette) -> Self {
        ColorAssigner::Sticky {
            held: HashMap::new(),
            free: (0..palette.len()).collect(),
        }
    }

    /// Builds this tick's assignment from the ranking (rank 0 = busiest).
    pub fn assign(&mut self, palette: &Palette, ranking: &[Pid]) -> ColorAssignment {
        let mut assignment = ColorAssignment::default();
        match self {
            ColorAssigner::Rank => {
                for (rank, pid) in ranking.iter().enumerate() {
                    assignment.push(rank, *pid, palette.cycle(rank));
                }
            }
            ColorAssigner::Sticky { held, free } => {
                let mut released: Vec<(Pid, usize)> = held
                    .iter()
                    .filter(|(pid, _)| !ranking.contains(*pid))
                    .map(|(pid, slot)| (*pid, *slot))
                    .collect();
                released.sort_unstable();
                for (pid, slot) in released {
                    held.remove(&pid);
                    free.push_back(slot);
                }

                for (rank, pid) in ranking.iter().enumerate() {
                    let color = match held.get(pid) {
                        Some(slot) => palette.cycle(*slot),
                        None => match free.pop_front() {
                            Some(slot) => {
                                held.insert(*pid, slot);
                                palette.cycle(slot)
                            }
                            None => palette.cycle(rank),
                        },
                    };
                    assignment.push(rank, *pid, color);
                }
            }
        }
        assignment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color_of(assignment: &ColorAssignment, pid: Pid) -> Option<Rgb> {
        assignment
            .entries()
            .iter()
            .find(|a| a.pid == pid)
            .map(|a| a.color)
    }

    #[test]
    fn test_palette_size() {
        assert_eq!(Palette::qualitative().len(), 15);
    }

    #[test]
    fn test_rank_cycles_with_period_k() {
        let palette = Palette::qualitative();
        let ranking: Vec<Pid> = (100..130).collect();
        let assignment = ColorAssigner::rank().assign(&palette, &ranking);

        let entries = assignment.entries();
        assert_eq!(entries.len(), 30);
        for rank in 0..15 {
            assert_eq!(entries[rank].color, entries[rank + 15].color);
        }
        assert_eq!(entries[0].color, palette.cycle(0));
        assert_ne!(entries[0].color, entries[1].color);
    }

    #[test]
    fn test_rank_not_sticky() {
        let palette = Palette::qualitative();
        let mut assigner = ColorAssigner::rank();

        let first = assigner.assign(&palette, &[1, 2]);
        let second = assigner.assign(&palette, &[2, 1]);
        assert_eq!(color_of(&first, 1), color_of(&second, 2));
        assert_ne!(color_of(&first, 1), color_of(&second, 1));
    }

    #[test]
    fn test_entries_keyed_by_pid() {
        let palette = Palette::qualitative();
        let assignment = ColorAssigner::rank().assign(&palette, &[42, 7]);
        let keys: Vec<&str> = assignment.entries().iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, vec!["42", "7"]);
        assert_eq!(color_of(&assignment, 42), Some(palette.cycle(0)));
        assert_eq!(color_of(&assignment, 7), Some(palette.cycle(1)));
        assert_eq!(color_of(&assignment, 8), None);
    }

    #[test]
    fn test_sticky_keeps_colour_across_reorder() {
        let palette = Palette::qualitative();
        let mut assigner = ColorAssigner::sticky(&palette);

        let first = assigner.assign(&palette, &[1, 2]);
        let second = assigner.assign(&palette, &[2, 1]);
        assert_eq!(color_of(&first, 1), color_of(&second, 1));
        assert_eq!(color_of(&first, 2), color_of(&second, 2));
    }

    #[test]
    fn test_sticky_reuses_released_colour() {
        let palette = Palette::qualitative();
        let mut assigner = ColorAssigner::sticky(&palette);

        let first = assigner.assign(&palette, &[1, 2]);
        // pid 1 drops out; its colour is released behind the untouched pool
        assigner.assign(&palette, &[2]);
        let third = assigner.assign(&palette, &[2, 3]);
        assert_eq!(color_of(&third, 3), Some(palette.cycle(2)));
        assert_eq!(color_of(&third, 2), color_of(&first, 2));
    }

    #[test]
    fn test_sticky_falls_back_to_rank_when_exhausted() {
        let palette = Palette::qualitative();
        let mut assigner = ColorAssigner::sticky(&palette);
        let ranking: Vec<Pid> = (1..=20).collect();
        let assignment = assigner.assign(&palette, &ranking);
        assert_eq!(assignment.entries().len(), 20);
        assert_eq!(assignment.entries()[17].color, palette.cycle(17));
    }
}
