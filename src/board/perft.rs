/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::collections::BTreeMap;

use log::debug;

use super::{LegalMove, PieceKind, Position, PositionError};

/// Every promotion choice, in the order traversal tries them.
const PROMOTIONS: [Option<PieceKind>; 4] = [
    Some(PieceKind::PROMOTIONS[0]),
    Some(PieceKind::PROMOTIONS[1]),
    Some(PieceKind::PROMOTIONS[2]),
    Some(PieceKind::PROMOTIONS[3]),
];

impl Position {
    /// Counts the leaf positions reachable in exactly `depth` plies.
    ///
    /// Each promotion counts four times, once for every piece the Pawn could become.
    ///
    /// This performs bulk counting, meaning that, at depth 1, it returns the number of available moves,
    /// rather than making them, recursing again, and returning 1 for each terminal case.
    ///
    /// The position is walked with [`Position::make`] and [`Position::unmake`], and is left exactly as it was.
    ///
    /// # Example
    /// ```
    /// # use crudechess::Position;
    /// let mut pos = Position::startpos();
    /// assert_eq!(pos.perft(0).unwrap(), 1);
    /// assert_eq!(pos.perft(2).unwrap(), 400);
    /// assert!(pos.perft(-1).is_err());
    /// ```
    pub fn perft(&mut self, depth: i32) -> Result<u64, PositionError> {
        let depth = checked_depth(depth)?;
        let nodes = self.count_nodes(depth)?;
        debug!("perft({depth}) = {nodes}");
        Ok(nodes)
    }

    /// Like [`Position::perft`], but reports the leaf count under each root move separately.
    ///
    /// Keys are move notation, with a promotion letter when one applies (`e2e4`, `e7e8Q`).
    /// A depth of 0 has no root moves to report, so the map is empty.
    ///
    /// # Example
    /// ```
    /// # use crudechess::Position;
    /// let mut pos = Position::startpos();
    /// let split = pos.divide(2).unwrap();
    /// assert_eq!(split.len(), 20);
    /// assert_eq!(split["e2e4"], 20);
    /// assert_eq!(split.values().sum::<u64>(), 400);
    /// ```
    pub fn divide(&mut self, depth: i32) -> Result<BTreeMap<String, u64>, PositionError> {
        let depth = checked_depth(depth)?;
        let mut split = BTreeMap::new();
        if depth == 0 {
            return Ok(split);
        }

        for mv in self.legal_moves().to_vec() {
            for &promotion in self.promotion_choices(mv) {
                self.make(mv.from(), mv.to(), promotion, false)?;
                let nodes = self.count_nodes(depth - 1)?;
                self.unmake()?;

                split.insert(mv.notation(promotion), nodes);
            }
        }

        debug!(
            "divide({depth}) = {} over {} root moves",
            split.values().sum::<u64>(),
            split.len()
        );
        Ok(split)
    }

    fn count_nodes(&mut self, depth: u32) -> Result<u64, PositionError> {
        // Recursion limit; return 1, since we're fathoming this node.
        if depth == 0 {
            return Ok(1);
        }

        // Bulk counting; a promotion stands for four moves, so it adds three on top of itself.
        if depth == 1 {
            let promotions = self
                .legal_moves()
                .iter()
                .filter(|&&mv| self.is_promotion(mv))
                .count();
            return Ok((self.legal_moves().len() + promotions * 3) as u64);
        }

        // The list is replaced on every `make`, so walk a copy of it
        let mut nodes = 0;
        for mv in self.legal_moves().to_vec() {
            for &promotion in self.promotion_choices(mv) {
                self.make(mv.from(), mv.to(), promotion, false)?;
                nodes += self.count_nodes(depth - 1)?;
                self.unmake()?;
            }
        }

        Ok(nodes)
    }

    /// The promotions to try for `mv`: all four if it promotes, otherwise just `None`.
    fn promotion_choices(&self, mv: LegalMove) -> &'static [Option<PieceKind>] {
        if self.is_promotion(mv) {
            &PROMOTIONS
        } else {
            &[None]
        }
    }
}

#[inline(always)]
fn checked_depth(depth: i32) -> Result<u32, PositionError> {
    u32::try_from(depth).map_err(|_| PositionError::InvalidDepth(depth))
}
